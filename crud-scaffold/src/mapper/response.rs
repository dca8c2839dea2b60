//! Envelope to HTTP response rendering

use axum::{
    http::{header, HeaderValue, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::envelope::{ServiceResult, SuccessStatus};

/// Target of a `Location` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Literal path or URL, rendered as given
    Path(String),
    /// Route template such as `"{id}"` or `"/api/widgets/{id}"`
    ///
    /// A relative template is appended to the current request path.
    Route {
        template: String,
        params: Vec<(String, String)>,
    },
}

impl Location {
    /// Literal location
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Route template with its parameters
    pub fn route<K, V>(template: impl Into<String>, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        Self::Route {
            template: template.into(),
            params: params
                .into_iter()
                .map(|(name, value)| (name.into(), value.to_string()))
                .collect(),
        }
    }

    /// Resolve against the request path, if one is known
    ///
    /// Returns `None` when the template names a parameter that was not supplied.
    pub fn resolve(&self, request_path: Option<&str>) -> Option<String> {
        match self {
            Self::Path(path) => Some(path.clone()),
            Self::Route { template, params } => {
                let rendered = render_template(template, params)?;
                match request_path {
                    Some(base) if !rendered.starts_with('/') => {
                        Some(format!("{}/{}", base.trim_end_matches('/'), rendered))
                    }
                    _ => Some(rendered),
                }
            }
        }
    }
}

fn render_template(template: &str, params: &[(String, String)]) -> Option<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}')?;
        let name = &after[..close];
        let (_, value) = params.iter().find(|(key, _)| key == name)?;
        rendered.push_str(value);
        rest = &after[close + 1..];
    }

    rendered.push_str(rest);
    Some(rendered)
}

/// How [`ApiResult`] writes its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyShape {
    /// Bare payload on success, the message string on failure
    Payload,
    /// The whole `{ isSuccess, result | errorResult }` envelope
    Envelope,
}

/// Transport rendering of a [`ServiceResult`] with an optional `Location`
///
/// By default successes render their status with the bare payload as JSON
/// and failures render only the error message as a JSON string; trace id and
/// detail stay in the logs. [`enveloped`](Self::enveloped) switches to the
/// full envelope body. `NoContent` never has a body, and `Location` is only
/// sent on success.
///
/// ```rust,ignore
/// async fn create(/* ... */) -> Result<ApiResult<WidgetView>, UnhandledFailure> {
///     let (id, view) = controller.create_located(request, &cancel).await?;
///     Ok(ApiResult::new(view.with_status(SuccessStatus::Created))
///         .enveloped()
///         .with_location(Location::route("{id}", [("id", id)]))
///         .in_context(&uri))
/// }
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ApiResult<T> {
    envelope: ServiceResult<T>,
    body: BodyShape,
    location: Option<Location>,
    request_path: Option<String>,
}

impl<T> ApiResult<T> {
    /// Payload-only rendering of `envelope`
    pub fn new(envelope: ServiceResult<T>) -> Self {
        Self {
            envelope,
            body: BodyShape::Payload,
            location: None,
            request_path: None,
        }
    }

    /// Render the full envelope instead of the bare payload
    pub fn enveloped(mut self) -> Self {
        self.body = BodyShape::Envelope;
        self
    }

    /// Attach a `Location` rendered on success
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Current request URI, used to resolve relative route templates
    pub fn in_context(mut self, uri: &Uri) -> Self {
        self.request_path = Some(uri.path().to_string());
        self
    }

    /// Wrapped envelope
    pub fn envelope(&self) -> &ServiceResult<T> {
        &self.envelope
    }

    fn location_header(&self) -> Option<HeaderValue> {
        let location = self.location.as_ref()?;
        let Some(resolved) = location.resolve(self.request_path.as_deref()) else {
            tracing::warn!(?location, "Location template could not be resolved, header dropped");
            return None;
        };
        match HeaderValue::from_str(&resolved) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(location = %resolved, "Location is not a valid header value, header dropped");
                None
            }
        }
    }
}

impl<T> From<ServiceResult<T>> for ApiResult<T> {
    fn from(envelope: ServiceResult<T>) -> Self {
        Self::new(envelope)
    }
}

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        let location = if self.envelope.is_success() {
            self.location_header()
        } else {
            None
        };

        let mut response = match self.body {
            BodyShape::Envelope => self.envelope.into_response(),
            BodyShape::Payload => payload_response(self.envelope),
        };

        if let Some(location) = location {
            response.headers_mut().insert(header::LOCATION, location);
        }
        response
    }
}

fn payload_response<T: Serialize>(envelope: ServiceResult<T>) -> Response {
    let status = envelope.status_code();
    match envelope.into_result() {
        Ok(success) if success.status() == SuccessStatus::NoContent => status.into_response(),
        Ok(success) => match success.into_data() {
            Some(data) => (status, Json(data)).into_response(),
            None => status.into_response(),
        },
        Err(failure) => match failure.data().message() {
            Some(message) => (status, Json(message)).into_response(),
            None => status.into_response(),
        },
    }
}

/// Full envelope body with the envelope's status
///
/// `NoContent` has no body. A failure envelope produced by a handler, such as
/// a projection refusing an entity, is logged under its trace id so clients
/// and logs can be correlated.
impl<T: Serialize> IntoResponse for ServiceResult<T> {
    fn into_response(self) -> Response {
        if let Some(error) = self.error() {
            tracing::warn!(
                trace_id = %error.data().trace_id(),
                code = error.data().code(),
                status = error.status().status_code().as_u16(),
                "Request failed: {}",
                error.data().message().unwrap_or("no message")
            );
        }
        envelope_response(self)
    }
}

/// Envelope rendering without logging, for callers that already logged it
pub(crate) fn envelope_response<T: Serialize>(envelope: ServiceResult<T>) -> Response {
    let status = envelope.status_code();
    match envelope.success() {
        Some(success) if success.status() == SuccessStatus::NoContent => status.into_response(),
        _ => (status, Json(envelope)).into_response(),
    }
}
