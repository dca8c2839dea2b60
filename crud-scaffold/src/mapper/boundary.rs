//! Unhandled-failure boundary
//!
//! Every failure escaping a handler is converted here, and only here, into a
//! failure envelope. Handlers return `Err(UnhandledFailure)`; its response
//! carries the failure as an extension, and the boundary middleware swaps that
//! response for the logged, fully-rendered envelope.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::config::Config;
use crate::crud::CrudError;
use crate::envelope::ServiceResult;
use crate::failure::{describe, DomainFailure, COMMON_ERROR_MESSAGE};

use super::response::envelope_response;

/// Fixed route of the unhandled-failure endpoint
pub const ERROR_ROUTE: &str = "/error";

/// A failure that reached the HTTP boundary
#[derive(Debug, thiserror::Error)]
pub enum UnhandledFailure {
    /// Typed domain failure
    #[error(transparent)]
    Domain(#[from] DomainFailure),

    /// The request's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// Anything outside the taxonomy
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl UnhandledFailure {
    /// Display of the failure followed by its cause chain
    pub fn describe(&self) -> String {
        match self {
            Self::Domain(domain) => describe(domain),
            Self::Cancelled => self.to_string(),
            Self::Unclassified(err) => {
                let mut description = err.to_string();
                for cause in err.chain().skip(1) {
                    description.push_str("\nCaused by: ");
                    description.push_str(&cause.to_string());
                }
                description
            }
        }
    }
}

impl From<CrudError> for UnhandledFailure {
    fn from(err: CrudError) -> Self {
        match err {
            CrudError::Failure(failure) => Self::Domain(failure),
            CrudError::Cancelled => Self::Cancelled,
        }
    }
}

/// Response extension carrying a raised failure to the boundary middleware
#[derive(Debug, Clone)]
pub struct RaisedFailure(pub Arc<UnhandledFailure>);

/// Bare 500 tagged with the failure
///
/// The boundary middleware replaces it with the rendered envelope; without
/// [`FailureBoundary::install`] the client only sees the status.
impl IntoResponse for UnhandledFailure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(RaisedFailure(Arc::new(self)));
        response
    }
}

/// Converts raised failures into failure envelopes
///
/// `sensitive` is fixed at construction. When false, the envelope's `detail`
/// carries the full failure description.
#[derive(Debug, Clone, Copy)]
pub struct FailureBoundary {
    sensitive: bool,
}

impl FailureBoundary {
    /// Boundary that redacts `detail` when `sensitive` is true
    pub fn new(sensitive: bool) -> Self {
        Self { sensitive }
    }

    /// Boundary for the configured deployment environment
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.is_sensitive_environment())
    }

    /// Whether failure detail is withheld from clients
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Map a failure onto its envelope and log it under the envelope's trace id
    pub fn convert(&self, raised: &UnhandledFailure) -> ServiceResult {
        let envelope = match raised {
            UnhandledFailure::Domain(failure) => ServiceResult::from_failure(failure),
            UnhandledFailure::Cancelled | UnhandledFailure::Unclassified(_) => {
                ServiceResult::global_system_error()
            }
        };

        let description = raised.describe();
        if let Some(error) = envelope.error() {
            tracing::error!(
                trace_id = %error.data().trace_id(),
                code = error.data().code(),
                status = error.status().status_code().as_u16(),
                failure = %description,
                "{}", COMMON_ERROR_MESSAGE
            );
        }

        if self.sensitive {
            envelope
        } else {
            envelope.map_error(|model| model.with_detail(description))
        }
    }

    /// Converted envelope as a full response
    pub fn render(&self, raised: &UnhandledFailure) -> Response {
        envelope_response(self.convert(raised))
    }

    /// Body of the `/error` endpoint
    ///
    /// Without failure context the result is the plain global system error,
    /// with no detail and nothing logged.
    pub fn respond(&self, raised: Option<&RaisedFailure>) -> Response {
        match raised {
            Some(RaisedFailure(failure)) => self.render(failure),
            None => envelope_response(ServiceResult::<()>::global_system_error()),
        }
    }

    /// Add the `/error` route and the intercepting middleware to `router`
    ///
    /// The middleware wraps every route already on `router`, so call this
    /// after all routes are mounted.
    pub fn install(self, router: Router) -> Router {
        router
            .route(ERROR_ROUTE, any(move || async move { self.respond(None) }))
            .layer(middleware::from_fn_with_state(self, intercept))
    }
}

async fn intercept(State(boundary): State<FailureBoundary>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    match response.extensions().get::<RaisedFailure>().cloned() {
        Some(raised) => boundary.respond(Some(&raised)),
        None => response,
    }
}

/// `CatchPanicLayer::custom` handler routing panics through the boundary
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    };
    UnhandledFailure::Unclassified(anyhow::anyhow!("handler panicked: {message}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{codes, FailureKind};
    use crate::store::{StoreError, StoreOperation};
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use tower::ServiceExt;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn every_kind() -> Vec<(DomainFailure, u16, &'static str)> {
        vec![
            (DomainFailure::database(StoreError::timeout(StoreOperation::Save, "slow")), 500, codes::DATABASE),
            (DomainFailure::operational(), 500, codes::OPERATIONAL),
            (DomainFailure::operational_code("QueueFull"), 500, "QueueFull"),
            (DomainFailure::system("CacheDown"), 500, "CacheDown"),
            (DomainFailure::unauthorized(), 401, codes::UNAUTHORIZED),
            (DomainFailure::forbidden(), 403, codes::FORBIDDEN),
            (DomainFailure::not_found(), 404, codes::NOT_FOUND),
            (DomainFailure::null(), 400, codes::NULL),
            (DomainFailure::already_exists(), 400, codes::ALREADY_EXISTS),
            (DomainFailure::business("QuotaExceeded"), 400, "QuotaExceeded"),
        ]
    }

    #[test]
    fn test_every_kind_maps_to_its_status_and_code() {
        let boundary = FailureBoundary::new(true);
        for (failure, status, code) in every_kind() {
            let envelope = boundary.convert(&UnhandledFailure::Domain(failure));
            let error = envelope.error().expect("failure envelope");
            assert_eq!(envelope.status_code().as_u16(), status, "{code}");
            assert_eq!(error.data().code(), code);
        }
    }

    #[test]
    fn test_unclassified_and_cancelled_map_to_global_system_error() {
        let boundary = FailureBoundary::new(true);
        for raised in [
            UnhandledFailure::Cancelled,
            UnhandledFailure::Unclassified(anyhow::anyhow!("boom")),
        ] {
            let envelope = boundary.convert(&raised);
            let model = envelope.error().unwrap().data();
            assert_eq!(envelope.status_code().as_u16(), 500);
            assert_eq!(model.code(), codes::SYSTEM_INTERNAL);
            assert_eq!(model.message(), Some(COMMON_ERROR_MESSAGE));
        }
    }

    #[test]
    fn test_sensitive_environment_redacts_detail() {
        let raised = UnhandledFailure::Domain(DomainFailure::database(StoreError::connection_failed(
            StoreOperation::FindAll,
            "host db-7 unreachable",
        )));

        let redacted = FailureBoundary::new(true).convert(&raised);
        assert_eq!(redacted.error().unwrap().data().detail(), None);

        let detailed = FailureBoundary::new(false).convert(&raised);
        assert_eq!(detailed.error().unwrap().data().detail(), Some(raised.describe().as_str()));
        assert!(raised.describe().contains("host db-7 unreachable"));
    }

    #[test]
    fn test_crud_error_conversion() {
        let cancelled: UnhandledFailure = CrudError::Cancelled.into();
        assert!(matches!(cancelled, UnhandledFailure::Cancelled));

        let domain: UnhandledFailure = CrudError::from(DomainFailure::not_found()).into();
        match domain {
            UnhandledFailure::Domain(failure) => assert_eq!(failure.kind(), &FailureKind::NotFound),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_describe_includes_anyhow_context() {
        let err = anyhow::anyhow!("socket closed").context("refreshing cache");
        let described = UnhandledFailure::Unclassified(err).describe();
        assert_eq!(described, "refreshing cache\nCaused by: socket closed");
    }

    fn app(boundary: FailureBoundary) -> Router {
        let routes = Router::new()
            .route(
                "/missing",
                get(|| async { Err::<(), _>(UnhandledFailure::from(DomainFailure::not_found())) }),
            )
            .route("/fine", get(|| async { "fine" }));
        boundary.install(routes)
    }

    #[tokio::test]
    async fn test_error_endpoint_without_context() {
        let response = app(FailureBoundary::new(true))
            .oneshot(HttpRequest::builder().uri(ERROR_ROUTE).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["errorResult"]["data"]["code"], codes::SYSTEM_INTERNAL);
        assert_eq!(body["errorResult"]["data"]["message"], COMMON_ERROR_MESSAGE);
        assert!(body["errorResult"]["data"].get("detail").is_none());
    }

    #[tokio::test]
    async fn test_error_endpoint_without_context_exposes_no_detail() {
        let response = app(FailureBoundary::new(false))
            .oneshot(HttpRequest::builder().uri(ERROR_ROUTE).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["errorResult"]["data"]["code"], codes::SYSTEM_INTERNAL);
        assert_eq!(body["errorResult"]["data"]["message"], COMMON_ERROR_MESSAGE);
        assert!(body["errorResult"]["data"].get("detail").is_none());
    }

    #[tokio::test]
    async fn test_error_endpoint_accepts_any_method() {
        let response = app(FailureBoundary::new(true))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri(ERROR_ROUTE)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_raised_failure_is_intercepted() {
        let response = app(FailureBoundary::new(false))
            .oneshot(HttpRequest::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["errorResult"]["status"], 404);
        assert_eq!(body["errorResult"]["data"]["code"], codes::NOT_FOUND);
        assert_eq!(
            body["errorResult"]["data"]["detail"],
            "Business failure NotFoundError"
        );
    }

    #[tokio::test]
    async fn test_successful_responses_pass_through() {
        let response = app(FailureBoundary::new(true))
            .oneshot(HttpRequest::builder().uri("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_panic_response_carries_failure() {
        let response = panic_response(Box::new("kaboom"));
        let raised = response.extensions().get::<RaisedFailure>().unwrap();
        assert!(raised.0.describe().contains("kaboom"));
    }
}
