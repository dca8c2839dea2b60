//! Domain failure taxonomy
//!
//! Every failure raised by CRUD logic is a [`DomainFailure`]: a closed set of
//! kinds, each with a stable string code, a severity [`ErrorLevel`] and exactly
//! one HTTP status. The mapping is written as exhaustive matches so adding a
//! kind without deciding its status is a compile error.
//!
//! # Example
//!
//! ```rust
//! use axum::http::StatusCode;
//! use crud_scaffold::failure::{DomainFailure, ErrorLevel, codes};
//!
//! let failure = DomainFailure::not_found();
//! assert_eq!(failure.code(), codes::NOT_FOUND);
//! assert_eq!(failure.level(), ErrorLevel::Business);
//! assert_eq!(failure.status_code(), StatusCode::NOT_FOUND);
//! ```

use axum::http::StatusCode;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::envelope::ErrorStatus;

/// Message returned to clients for failures that have no safe specific message.
pub const COMMON_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Stable error codes shared by failures and error envelopes
pub mod codes {
    /// Store operation failed
    pub const DATABASE: &str = "DatabaseError";
    /// Operational (infrastructure) failure without a more specific code
    pub const OPERATIONAL: &str = "OperationalError";
    /// Caller is not authenticated
    pub const UNAUTHORIZED: &str = "UnauthorizedError";
    /// Caller may not perform the operation
    pub const FORBIDDEN: &str = "ForbiddenError";
    /// Target entity does not exist
    pub const NOT_FOUND: &str = "NotFoundError";
    /// A required value was missing
    pub const NULL: &str = "NullError";
    /// Entity conflicts with an existing one
    pub const ALREADY_EXISTS: &str = "AlreadyExistsError";
    /// Unclassified system failure
    pub const SYSTEM_INTERNAL: &str = "SystemInternalServerError";
    /// Unclassified business failure
    pub const BUSINESS_INTERNAL: &str = "BusinessInternalServerError";
}

/// Severity level of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorLevel {
    /// Infrastructure or platform fault
    System,
    /// Rule violation caused by the request
    Business,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "System"),
            Self::Business => write!(f, "Business"),
        }
    }
}

/// Kind of domain failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Store read or write failed
    Database,
    /// Operational fault, carrying its own code
    Operational(Cow<'static, str>),
    /// Caller is not authenticated
    Unauthorized,
    /// Generic system failure with a custom code
    System(Cow<'static, str>),
    /// Caller may not perform the operation
    Forbidden,
    /// Target entity does not exist
    NotFound,
    /// A required value was missing
    Null,
    /// Entity conflicts with an existing one
    AlreadyExists,
    /// Generic business failure with a custom code
    Business(Cow<'static, str>),
}

impl FailureKind {
    /// Stable code for this kind
    pub fn code(&self) -> &str {
        match self {
            Self::Database => codes::DATABASE,
            Self::Operational(code) | Self::System(code) | Self::Business(code) => code,
            Self::Unauthorized => codes::UNAUTHORIZED,
            Self::Forbidden => codes::FORBIDDEN,
            Self::NotFound => codes::NOT_FOUND,
            Self::Null => codes::NULL,
            Self::AlreadyExists => codes::ALREADY_EXISTS,
        }
    }

    /// Severity level for this kind
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::Database | Self::Operational(_) | Self::Unauthorized | Self::System(_) => {
                ErrorLevel::System
            }
            Self::Forbidden
            | Self::NotFound
            | Self::Null
            | Self::AlreadyExists
            | Self::Business(_) => ErrorLevel::Business,
        }
    }

    /// Envelope status class this kind maps to
    pub fn error_status(&self) -> ErrorStatus {
        match self {
            Self::Database | Self::Operational(_) | Self::System(_) => {
                ErrorStatus::InternalServerError
            }
            Self::Unauthorized => ErrorStatus::Unauthorized,
            Self::Forbidden => ErrorStatus::Forbidden,
            Self::NotFound => ErrorStatus::NotFound,
            Self::Null | Self::AlreadyExists | Self::Business(_) => ErrorStatus::BadRequest,
        }
    }

    /// HTTP status this kind maps to
    pub fn status_code(&self) -> StatusCode {
        self.error_status().status_code()
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A typed domain failure
///
/// Created where the failure is detected and propagated with `?` up to the
/// boundary that turns it into an envelope. The optional cause is kept for
/// logs and the non-sensitive `detail` field; it is never sent as the message.
#[derive(Debug)]
pub struct DomainFailure {
    kind: FailureKind,
    message: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl DomainFailure {
    /// Create a failure of the given kind
    #[must_use]
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Store failure wrapping the underlying cause
    #[must_use]
    pub fn database(cause: impl StdError + Send + Sync + 'static) -> Self {
        Self::new(FailureKind::Database).with_source(cause)
    }

    /// Operational failure with the default `OperationalError` code
    #[must_use]
    pub fn operational() -> Self {
        Self::new(FailureKind::Operational(Cow::Borrowed(codes::OPERATIONAL)))
    }

    /// Operational failure with a custom code
    #[must_use]
    pub fn operational_code(code: impl Into<Cow<'static, str>>) -> Self {
        Self::new(FailureKind::Operational(code.into()))
    }

    /// Caller is not authenticated
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(FailureKind::Unauthorized)
    }

    /// Generic system failure with a custom code
    #[must_use]
    pub fn system(code: impl Into<Cow<'static, str>>) -> Self {
        Self::new(FailureKind::System(code.into()))
    }

    /// Caller may not perform the operation
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(FailureKind::Forbidden)
    }

    /// Target entity does not exist
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(FailureKind::NotFound)
    }

    /// A required value was missing
    #[must_use]
    pub fn null() -> Self {
        Self::new(FailureKind::Null)
    }

    /// Entity conflicts with an existing one
    #[must_use]
    pub fn already_exists() -> Self {
        Self::new(FailureKind::AlreadyExists)
    }

    /// Generic business failure with a custom code
    #[must_use]
    pub fn business(code: impl Into<Cow<'static, str>>) -> Self {
        Self::new(FailureKind::Business(code.into()))
    }

    /// Attach a client-safe message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(cause));
        self
    }

    /// The failure kind
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Stable error code
    pub fn code(&self) -> &str {
        self.kind.code()
    }

    /// Severity level
    pub fn level(&self) -> ErrorLevel {
        self.kind.level()
    }

    /// HTTP status
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Client-safe message, if one was attached
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for DomainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure {}", self.level(), self.code())?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl StdError for DomainFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Render an error together with its full cause chain
///
/// Used for the `detail` field and for log lines.
pub fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut description = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        description.push_str("\nCaused by: ");
        description.push_str(&cause.to_string());
        current = cause.source();
    }
    description
}
