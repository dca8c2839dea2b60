//! Result-to-transport mapping
//!
//! Two directions:
//!
//! - [`ApiResult`] renders a [`ServiceResult`](crate::envelope::ServiceResult)
//!   as an HTTP response, with an optional `Location` header.
//! - [`FailureBoundary`] converts an [`UnhandledFailure`] into a failure
//!   envelope, logging it and redacting detail in sensitive environments.

mod boundary;
mod response;

pub use boundary::{panic_response, FailureBoundary, RaisedFailure, UnhandledFailure, ERROR_ROUTE};
pub use response::{ApiResult, Location};
