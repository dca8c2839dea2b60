//! Entity base record and typed accessors
//!
//! Entity types embed a [`Record`] holding the identifier, audit timestamps
//! and soft-delete flag, and implement [`Entity`] to expose it. The CRUD
//! service only ever reads an entity through [`Entity::id`] and
//! [`Entity::is_deleted`]; nothing is looked up by field name.
//!
//! ```rust
//! use crud_scaffold::entity::{Entity, Record};
//!
//! #[derive(Debug, Clone)]
//! struct Widget {
//!     record: Record,
//!     name: String,
//! }
//!
//! impl Entity for Widget {
//!     fn record(&self) -> &Record {
//!         &self.record
//!     }
//!
//!     fn record_mut(&mut self) -> &mut Record {
//!         &mut self.record
//!     }
//! }
//!
//! let widget = Widget { record: Record::default(), name: "sprocket".into() };
//! assert!(!widget.is_deleted());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned numeric identifier
pub type EntityId = i64;

/// Identifier, audit timestamps and soft-delete flag shared by all entities
///
/// A fresh record has id `0` and `UNIX_EPOCH` timestamps; the store assigns
/// the real values when the entity is added and saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned identifier
    pub id: EntityId,
    /// Set by the store when the entity is first saved
    pub created_at: DateTime<Utc>,
    /// Set by the store on every save
    pub updated_at: DateTime<Utc>,
    /// Soft-delete flag; deleted records are hidden from standard lookups
    pub is_deleted: bool,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            is_deleted: false,
        }
    }
}

impl Record {
    /// Flag the record as soft-deleted
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }
}

/// A persistable entity
pub trait Entity: Clone + Send + Sync + 'static {
    /// The embedded base record
    fn record(&self) -> &Record;

    /// Mutable access to the embedded base record
    fn record_mut(&mut self) -> &mut Record;

    /// Identifier accessor
    fn id(&self) -> EntityId {
        self.record().id
    }

    /// Soft-delete accessor
    fn is_deleted(&self) -> bool {
        self.record().is_deleted
    }
}

/// Caller-supplied list constraints for one entity type
///
/// There is no blanket implementation: each entity type states
/// how its filter selects rows. Use [`Unfiltered`] to opt out explicitly.
pub trait QueryFilter<E>: Send + Sync {
    /// Whether `entity` belongs in the listing
    fn matches(&self, entity: &E) -> bool;

    /// True for filters that accept every entity
    fn is_pass_through(&self) -> bool {
        false
    }
}

/// Filter that accepts every (non-deleted) entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unfiltered {}

impl<E> QueryFilter<E> for Unfiltered {
    fn matches(&self, _entity: &E) -> bool {
        true
    }

    fn is_pass_through(&self) -> bool {
        true
    }
}
