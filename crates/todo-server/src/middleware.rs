//! Middleware pipeline for the Todo API.
//!
//! The pipeline is an ordered list of [`Middleware`] stages, outermost first:
//! 1. Tracing - one `http_request` span per request, skipping probe paths
//! 2. Panic recovery - a panicking handler becomes a JSON 500
//! 3. CORS - only present in the local environment
//!
//! `Router::layer` wraps the existing stack, so [`apply_pipeline`] folds the
//! stages in reverse to keep the first stage outermost.

use std::any::Any;
use std::time::Duration;

use axum::{
    response::{IntoResponse, Response},
    Router,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use opentelemetry::{global, propagation::Extractor};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing::{debug, error, field, info_span, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::{auth::API_KEY_HEADER, error::ApiError, error::ServerError};

/// Paths that never get a request span
pub const UNTRACED_PATHS: [&str; 2] = ["/api/ping", "/metrics"];

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// One stage of the request pipeline
#[derive(Debug, Clone)]
pub enum Middleware {
    /// Request span creation
    Tracing(RequestTracing),
    /// Panic to 500 conversion
    PanicRecovery,
    /// Cross-origin policy
    Cors(CorsPolicy),
}

impl Middleware {
    /// Short stage name, used in logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tracing(_) => "tracing",
            Self::PanicRecovery => "panic_recovery",
            Self::Cors(_) => "cors",
        }
    }

    fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self {
            Self::Tracing(tracing) => router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(tracing)
                    .on_response(RecordStatus),
            ),
            Self::PanicRecovery => router.layer(CatchPanicLayer::custom(handle_panic)),
            Self::Cors(policy) => router.layer(policy.layer()),
        }
    }
}

/// Wrap `router` with the given stages, the first stage outermost
pub fn apply_pipeline<S>(router: Router<S>, pipeline: Vec<Middleware>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pipeline.into_iter().rev().fold(router, |router, stage| {
        debug!(stage = stage.name(), "Applying middleware");
        stage.apply(router)
    })
}

/// Creates the per-request span, continuing any W3C trace context the caller
/// sent.
#[derive(Debug, Clone)]
pub struct RequestTracing {
    service_name: String,
    excluded_paths: Vec<String>,
}

impl RequestTracing {
    /// Tracing for `service_name` with the default exclusion list
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            excluded_paths: UNTRACED_PATHS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Service name recorded on each span
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Whether requests to `path` get a span. Matching is exact.
    #[must_use]
    pub fn should_trace(&self, path: &str) -> bool {
        !self.excluded_paths.iter().any(|excluded| excluded == path)
    }
}

impl<B> MakeSpan<B> for RequestTracing {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let path = request.uri().path();
        if !self.should_trace(path) {
            return Span::none();
        }

        let span = info_span!(
            "http_request",
            otel.name = %format!("{} {}", request.method(), path),
            otel.kind = "server",
            otel.status_code = field::Empty,
            service.name = %self.service_name,
            http.method = %request.method(),
            http.target = %request.uri(),
            http.user_agent = field::Empty,
            http.status_code = field::Empty,
        );

        if let Some(agent) = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
        {
            span.record("http.user_agent", agent);
        }

        let parent = global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderExtractor(request.headers()))
        });
        span.set_parent(parent);

        span
    }
}

/// Records the response status on the request span
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordStatus;

impl<B> OnResponse<B> for RecordStatus {
    fn on_response(self, response: &http::Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("http.status_code", status.as_u16());
        if status.is_server_error() {
            span.record("otel.status_code", "ERROR");
        }
        debug!(
            parent: span,
            status = status.as_u16(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Converts a handler panic into the generic 500 response
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else {
        "non-string panic payload"
    };

    error!(panic = %detail, "Request handler panicked");
    ApiError::internal().into_response()
}

/// Cross-origin policy for browser clients
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origin: HeaderValue,
}

impl CorsPolicy {
    /// Allow a single origin
    pub fn new(origin: &str) -> Result<Self, ServerError> {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| ServerError::Config(format!("invalid CORS origin {origin:?}: {e}")))?;
        Ok(Self { origin })
    }

    /// Build the CORS layer
    #[must_use]
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.origin.clone())
            .allow_headers([
                header::ORIGIN,
                header::AUTHORIZATION,
                HeaderName::from_static(API_KEY_HEADER),
            ])
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::HEAD,
                Method::OPTIONS,
            ])
            .max_age(CORS_MAX_AGE)
    }
}
