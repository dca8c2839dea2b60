//! Entity-set error types
//!
//! A [`StoreError`] is the opaque failure any [`EntitySet`](super::EntitySet)
//! call may return. The CRUD service never inspects it beyond logging: it is
//! wrapped into a `Database` [`DomainFailure`](crate::failure::DomainFailure)
//! and kept as that failure's cause.
//!
//! # Example
//!
//! ```rust
//! use crud_scaffold::store::{StoreError, StoreErrorKind, StoreOperation};
//!
//! let error = StoreError::connection_failed(StoreOperation::Save, "connection refused");
//! assert_eq!(error.kind, StoreErrorKind::ConnectionFailed);
//! assert!(error.is_retriable());
//! ```

use std::fmt;

/// Entity-set call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `find_one`
    FindOne,
    /// `find_all`
    FindAll,
    /// `add`
    Add,
    /// `update`
    Update,
    /// `save`
    Save,
    /// `discard`
    Discard,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindOne => write!(f, "find_one"),
            Self::FindAll => write!(f, "find_all"),
            Self::Add => write!(f, "add"),
            Self::Update => write!(f, "update"),
            Self::Save => write!(f, "save"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Could not reach the store
    ConnectionFailed,
    /// The store did not answer in time
    Timeout,
    /// A constraint rejected the write
    ConstraintViolation,
    /// `update` was given an entity the store does not hold
    MissingEntity,
    /// Row could not be (de)serialized
    Serialization,
    /// Anything else
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::MissingEntity => write!(f, "missing_entity"),
            Self::Serialization => write!(f, "serialization"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The entity-set call that failed
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable message (internal; never sent to clients)
    pub message: String,
}

impl StoreError {
    /// Create a new store error
    pub fn new(operation: StoreOperation, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Connection could not be established or was lost
    pub fn connection_failed(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConnectionFailed, message)
    }

    /// The store timed out
    pub fn timeout(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Timeout, message)
    }

    /// A constraint rejected the write
    pub fn constraint_violation(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConstraintViolation, message)
    }

    /// `update` referenced an entity the store does not hold
    pub fn missing_entity(id: crate::entity::EntityId) -> Self {
        Self::new(
            StoreOperation::Update,
            StoreErrorKind::MissingEntity,
            format!("no stored entity with id {}", id),
        )
    }

    /// Whether a retry may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )
    }
}

impl std::error::Error for StoreError {}
