//! HTTP request handlers for the Todo API.

use axum::{
    extract::State,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use todo_core::{PingResponse, Todo};
use tracing::debug;

use crate::{auth::AuthDecision, error::ApiError, state::AppState};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/ping",
    tag = "ping",
    responses(
        (status = 200, description = "Service is up", body = PingResponse)
    )
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse::ok())
}

/// Fetch the sample todo
///
/// Requires a valid `X-API-KEY` header. The gate's 401 is returned unchanged
/// on failure.
#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "todos",
    responses(
        (status = 200, description = "The todo", body = Todo),
        (status = 401, description = "Missing or invalid API key", body = String, content_type = "text/plain")
    ),
    security(("ApiKeyAuth" = []))
)]
pub async fn get_todo(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    match state.auth.verify(&method, &uri, &headers) {
        AuthDecision::Authorized => Json(Todo::sample()).into_response(),
        AuthDecision::Denied(response) => response,
    }
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> ApiError {
    debug!(path = %uri.path(), "No route matched");
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
