//! Error types for the HTTP surface and the server lifecycle.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use todo_core::ErrorResponse;

/// Errors rendered to clients as `{"error":{"type","message"}}`
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Unrecoverable failure while handling a request
    #[error("{0}")]
    Internal(String),
    /// No route matched
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// Internal error with the generic client-facing message
    #[must_use]
    pub fn internal() -> Self {
        Self::Internal("Internal server error".to_string())
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Value of the `type` field in the response body
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Internal(_) => "internal_error",
            Self::NotFound(_) => "not_found_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.error_type(), self.to_string());
        (self.status_code(), Json(body)).into_response()
    }
}

/// Server startup and runtime errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Listener I/O failure
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
    /// The accept task panicked or was cancelled unexpectedly
    #[error("Server task failed: {0}")]
    Task(String),
    /// Router configuration rejected
    #[error("Invalid server configuration: {0}")]
    Config(String),
}

impl ServerError {
    /// Bind error for the given address
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }
}
