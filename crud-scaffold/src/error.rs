//! Infrastructure error types
//!
//! These errors cover the plumbing around the CRUD core: loading configuration,
//! binding the listener and serving requests. Failures raised by CRUD operations
//! themselves are [`DomainFailure`](crate::failure::DomainFailure)s and travel
//! through the result envelope instead.

use thiserror::Error;

/// Infrastructure error
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the crate's infrastructure [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
