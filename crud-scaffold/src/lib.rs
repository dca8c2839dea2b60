//! # crud-scaffold
//!
//! Reusable CRUD scaffolding for axum APIs backed by a relational store.
//!
//! ## Features
//!
//! - **Result envelope**: every outcome is a [`ServiceResult`](envelope::ServiceResult),
//!   either a success with an optional payload or a failure with an error model
//! - **Error taxonomy**: typed [`DomainFailure`](failure::DomainFailure)s with
//!   stable codes, each mapped to exactly one HTTP status
//! - **Generic CRUD**: get/list/create/update/soft-delete over any
//!   [`EntitySet`](store::EntitySet), with per-entity hooks
//! - **Failure boundary**: one place converts unhandled failures to envelopes,
//!   logging a trace id and redacting detail in sensitive environments
//! - **Graceful shutdown**: SIGTERM/SIGINT cancel in-flight operations
//!
//! ## Example
//!
//! ```rust,ignore
//! use crud_scaffold::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let server = Server::new(config);
//!     let widgets = CrudController::new(CrudService::new(
//!         MemoryEntitySet::<Widget>::new(),
//!         WidgetCapabilities,
//!     ));
//!     let routes = Router::new().nest(
//!         "/api/widgets",
//!         crud_router(widgets, server.shutdown_token()),
//!     );
//!
//!     server.serve(routes).await
//! }
//! ```

pub mod config;
pub mod crud;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod failure;
pub mod ids;
pub mod mapper;
pub mod store;

#[cfg(feature = "observability")]
pub mod observability;

#[cfg(feature = "http")]
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DeploymentEnvironment, ServiceConfig};
    pub use crate::crud::{CrudController, CrudError, CrudService, EntityCapabilities, EntityMapper};
    pub use crate::entity::{Entity, EntityId, QueryFilter, Record, Unfiltered};
    pub use crate::envelope::{ErrorModel, ErrorStatus, ServiceResult, SuccessStatus};
    pub use crate::error::{Error, Result};
    pub use crate::failure::{DomainFailure, ErrorLevel, FailureKind, COMMON_ERROR_MESSAGE};
    pub use crate::ids::TraceId;
    pub use crate::mapper::{ApiResult, FailureBoundary, Location, UnhandledFailure};
    pub use crate::store::{EntitySet, MemoryEntitySet, StoreError, StoreResult};

    #[cfg(feature = "http")]
    pub use crate::crud::crud_router;

    #[cfg(feature = "http")]
    pub use crate::server::Server;

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_tracing, shutdown_tracing};

    pub use tokio_util::sync::CancellationToken;

    pub use axum::{
        extract::{Path, Query, State},
        routing::{delete, get, post, put},
        Json, Router,
    };

    pub use serde::{Deserialize, Serialize};
}
