//! # API Key Authentication
//!
//! A single shared secret guards the todo resource. Clients send it in the
//! `X-API-KEY` header and the gate compares it for exact equality: no
//! trimming, no case folding. A missing or non-UTF-8 header is compared as the
//! empty string, which never matches because configuration rejects an empty
//! key.
//!
//! Every check runs in an `auth` span. Successful checks record
//! `auth.valid = "OK"`, failed ones mark the span as an OpenTelemetry error.
//! Failures are logged individually; there is no lockout or rate limiting.

use std::sync::Arc;

use axum::{
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, field, info, info_span};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Body of the denial response
const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// Outcome of an authentication check
#[derive(Debug)]
pub enum AuthDecision {
    /// The presented key matched
    Authorized,
    /// The presented key did not match; the response is ready to return
    Denied(Response),
}

impl AuthDecision {
    /// Whether the request may proceed
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Shared-secret authentication gate
#[derive(Clone)]
pub struct ApiKeyGate {
    expected: Arc<SecretString>,
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate").finish_non_exhaustive()
    }
}

impl ApiKeyGate {
    /// Create a gate expecting the given secret
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            expected: Arc::new(api_key),
        }
    }

    /// Exact comparison against the configured secret
    #[must_use]
    pub fn is_authorized(&self, presented: &str) -> bool {
        presented == self.expected.expose_secret()
    }

    /// Check the request's `X-API-KEY` header.
    ///
    /// On denial the returned decision carries a `401` with the plain-text
    /// body `Unauthorized`.
    pub fn verify(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> AuthDecision {
        let span = info_span!(
            "auth",
            auth.valid = field::Empty,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );
        let _entered = span.enter();

        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if self.is_authorized(presented) {
            span.record("auth.valid", "OK");
            info!("Auth Ok - Url: {} {}", method, uri.path());
            AuthDecision::Authorized
        } else {
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", "authentication failed");
            error!(
                key_present = !presented.is_empty(),
                "Auth Unauthorized - Url: {} {}",
                method,
                uri.path()
            );
            AuthDecision::Denied(unauthorized())
        }
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response()
}
