//! Result envelope returned by every CRUD operation
//!
//! A [`ServiceResult`] is either a success carrying an optional payload or a
//! failure carrying an [`ErrorModel`], never both. Instances are only built
//! through the named constructors and cannot be mutated afterwards, so
//! [`ServiceResult::is_success`] always agrees with the stored variant.
//!
//! # Wire format
//!
//! ```json
//! { "isSuccess": true,  "result":      { "status": 200, "data": { "id": 7 } } }
//! { "isSuccess": false, "errorResult": { "status": 404, "data": { "traceId": "trace_...", "code": "NotFoundError" } } }
//! ```
//!
//! # Example
//!
//! ```rust
//! use crud_scaffold::envelope::{ServiceResult, SuccessStatus};
//!
//! let found = ServiceResult::ok(42);
//! assert!(found.is_success());
//! assert_eq!(found.success().unwrap().status(), SuccessStatus::Ok);
//!
//! let missing: ServiceResult<i32> = ServiceResult::not_found();
//! assert!(!missing.is_success());
//! assert_eq!(missing.error().unwrap().data().code(), "NotFoundError");
//! ```

use axum::http::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::failure::{codes, DomainFailure, COMMON_ERROR_MESSAGE};
use crate::ids::TraceId;

/// Status of a successful outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuccessStatus {
    /// 200
    Ok,
    /// 201
    Created,
    /// 202
    Accepted,
    /// 204
    NoContent,
}

impl SuccessStatus {
    /// HTTP status code
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Created => StatusCode::CREATED,
            Self::Accepted => StatusCode::ACCEPTED,
            Self::NoContent => StatusCode::NO_CONTENT,
        }
    }
}

/// Status class of a failed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 500
    InternalServerError,
}

impl ErrorStatus {
    /// HTTP status code
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Serialize for SuccessStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.status_code().as_u16())
    }
}

impl Serialize for ErrorStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.status_code().as_u16())
    }
}

/// Error payload of a failed outcome
///
/// Every instance gets a fresh [`TraceId`] at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorModel {
    trace_id: TraceId,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ErrorModel {
    /// Create an error model with a fresh trace id
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            trace_id: TraceId::new(),
            code: code.into(),
            message: None,
            detail: None,
        }
    }

    /// Attach a client-facing message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach internal detail (only for non-sensitive environments)
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Correlation id shared with the server log
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Stable error code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Client-facing message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Internal detail
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Success variant body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessResult<T> {
    status: SuccessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> SuccessResult<T> {
    /// Success status
    pub fn status(&self) -> SuccessStatus {
        self.status
    }

    /// Payload, if any
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Take the payload
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Failure variant body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResult {
    status: ErrorStatus,
    data: ErrorModel,
}

impl ErrorResult {
    /// Failure status class
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Error payload
    pub fn data(&self) -> &ErrorModel {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome<T> {
    Success(SuccessResult<T>),
    Failure(ErrorResult),
}

/// Discriminated outcome of an operation
///
/// `ServiceResult<()>` is the payload-less form.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResult<T = ()> {
    outcome: Outcome<T>,
}

impl<T> ServiceResult<T> {
    fn new_success(status: SuccessStatus, data: Option<T>) -> Self {
        Self {
            outcome: Outcome::Success(SuccessResult { status, data }),
        }
    }

    fn failure(status: ErrorStatus, data: ErrorModel) -> Self {
        Self {
            outcome: Outcome::Failure(ErrorResult { status, data }),
        }
    }

    /// 200 with optional payload
    pub fn ok(data: impl Into<Option<T>>) -> Self {
        Self::new_success(SuccessStatus::Ok, data.into())
    }

    /// 201 with optional payload
    pub fn created(data: impl Into<Option<T>>) -> Self {
        Self::new_success(SuccessStatus::Created, data.into())
    }

    /// 202 with optional payload
    pub fn accepted(data: impl Into<Option<T>>) -> Self {
        Self::new_success(SuccessStatus::Accepted, data.into())
    }

    /// 204 with optional payload
    pub fn no_content(data: impl Into<Option<T>>) -> Self {
        Self::new_success(SuccessStatus::NoContent, data.into())
    }

    /// 500 with the given error
    pub fn system_error(data: ErrorModel) -> Self {
        Self::failure(ErrorStatus::InternalServerError, data)
    }

    /// 500 `SystemInternalServerError` with the common message
    pub fn global_system_error() -> Self {
        Self::system_error(
            ErrorModel::new(codes::SYSTEM_INTERNAL).with_message(COMMON_ERROR_MESSAGE),
        )
    }

    /// 401 `UnauthorizedError`
    pub fn unauthorized() -> Self {
        Self::failure(ErrorStatus::Unauthorized, ErrorModel::new(codes::UNAUTHORIZED))
    }

    /// 400 with the given error
    pub fn business_error(data: ErrorModel) -> Self {
        Self::failure(ErrorStatus::BadRequest, data)
    }

    /// 400 `BusinessInternalServerError` with the common message
    pub fn global_business_error() -> Self {
        Self::business_error(
            ErrorModel::new(codes::BUSINESS_INTERNAL).with_message(COMMON_ERROR_MESSAGE),
        )
    }

    /// 404 `NotFoundError`
    pub fn not_found() -> Self {
        Self::failure(ErrorStatus::NotFound, ErrorModel::new(codes::NOT_FOUND))
    }

    /// 400 `AlreadyExistsError`
    pub fn already_exists() -> Self {
        Self::business_error(ErrorModel::new(codes::ALREADY_EXISTS))
    }

    /// 403 `ForbiddenError`
    pub fn forbidden() -> Self {
        Self::failure(ErrorStatus::Forbidden, ErrorModel::new(codes::FORBIDDEN))
    }

    /// Failure envelope for a domain failure
    ///
    /// Status and code follow the failure's kind. A message attached to the
    /// failure is carried over; the cause is not. Only the failure boundary
    /// converts failures, so every failure envelope it sends has been logged.
    pub(crate) fn from_failure(failure: &DomainFailure) -> Self {
        let mut model = ErrorModel::new(failure.code());
        if let Some(message) = failure.message() {
            model = model.with_message(message);
        }
        Self::failure(failure.kind().error_status(), model)
    }

    /// Whether this is the success variant
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Success body, if this is a success
    pub fn success(&self) -> Option<&SuccessResult<T>> {
        match &self.outcome {
            Outcome::Success(result) => Some(result),
            Outcome::Failure(_) => None,
        }
    }

    /// Failure body, if this is a failure
    pub fn error(&self) -> Option<&ErrorResult> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(result) => Some(result),
        }
    }

    /// HTTP status of the active variant
    pub fn status_code(&self) -> StatusCode {
        match &self.outcome {
            Outcome::Success(result) => result.status.status_code(),
            Outcome::Failure(result) => result.status.status_code(),
        }
    }

    /// Split into the active variant
    pub fn into_result(self) -> Result<SuccessResult<T>, ErrorResult> {
        match self.outcome {
            Outcome::Success(result) => Ok(result),
            Outcome::Failure(result) => Err(result),
        }
    }

    /// Project the payload, keeping status and failures as they are
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        match self.outcome {
            Outcome::Success(SuccessResult { status, data }) => {
                ServiceResult::new_success(status, data.map(f))
            }
            Outcome::Failure(result) => ServiceResult {
                outcome: Outcome::Failure(result),
            },
        }
    }

    /// Re-label a success with another status; failures are returned unchanged
    pub fn with_status(self, status: SuccessStatus) -> Self {
        match self.outcome {
            Outcome::Success(SuccessResult { data, .. }) => Self::new_success(status, data),
            failure => Self { outcome: failure },
        }
    }

    /// Drop the payload type
    pub fn into_untyped(self) -> ServiceResult {
        self.map(|_| ()).drop_unit()
    }

    /// Rewrite the error model of a failure
    pub(crate) fn map_error(self, f: impl FnOnce(ErrorModel) -> ErrorModel) -> Self {
        match self.outcome {
            Outcome::Failure(ErrorResult { status, data }) => Self::failure(status, f(data)),
            success => Self { outcome: success },
        }
    }
}

impl ServiceResult<()> {
    fn drop_unit(self) -> Self {
        match self.outcome {
            Outcome::Success(SuccessResult { status, .. }) => Self::new_success(status, None),
            failure => Self { outcome: failure },
        }
    }
}

impl<T: Serialize> Serialize for ServiceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ServiceResult", 2)?;
        match &self.outcome {
            Outcome::Success(result) => {
                state.serialize_field("isSuccess", &true)?;
                state.serialize_field("result", result)?;
            }
            Outcome::Failure(result) => {
                state.serialize_field("isSuccess", &false)?;
                state.serialize_field("errorResult", result)?;
            }
        }
        state.end()
    }
}
