//! Response bodies that are not resources.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::SERVICE_VERSION;

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    /// Status line, including the service version
    #[schema(example = "Ok - versión: 0.1.0")]
    pub message: String,
}

impl PingResponse {
    /// Response returned while the service is up
    #[must_use]
    pub fn ok() -> Self {
        Self {
            message: format!("Ok - versión: {SERVICE_VERSION}"),
        }
    }
}

/// Machine-parseable error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error type and human readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable error code (e.g. `internal_error`)
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human readable message
    pub message: String,
}

impl ErrorResponse {
    /// Build an error body
    #[must_use]
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }
}
