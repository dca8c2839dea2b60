//! Generic CRUD service and controller
//!
//! [`CrudService`] runs the get/list/create/update/delete workflow for any
//! entity type over an [`EntitySet`](crate::store::EntitySet), delegating the
//! entity-specific parts to an [`EntityCapabilities`] implementation.
//! [`CrudController`] wraps the service and turns its results into
//! [`ServiceResult`](crate::envelope::ServiceResult) envelopes, and
//! [`crud_router`] (feature `http`) exposes a controller over HTTP.

mod capabilities;
mod controller;
mod projection;
#[cfg(feature = "http")]
mod routes;
mod service;

#[cfg(test)]
pub(crate) mod fixtures;

pub use capabilities::EntityCapabilities;
pub use controller::CrudController;
pub use projection::EntityMapper;
#[cfg(feature = "http")]
pub use routes::crud_router;
pub use service::CrudService;

use crate::failure::DomainFailure;

/// Error raised by the CRUD core
///
/// Cancellation is kept apart from domain failures so it is never reported
/// as a database error.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// Typed domain failure
    #[error(transparent)]
    Failure(#[from] DomainFailure),

    /// The operation's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,
}

impl CrudError {
    /// Whether the operation was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
