//! # Todo Server
//!
//! HTTP server implementation for the Todo API.
//!
//! This crate provides:
//! - Axum-based HTTP server with a fixed route table
//! - API key authentication for the todo resource
//! - Request tracing, panic recovery and CORS middleware
//! - Swagger UI in the local environment
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use auth::{ApiKeyGate, AuthDecision, API_KEY_HEADER};
pub use error::{ApiError, ServerError};
pub use middleware::{CorsPolicy, Middleware, RequestTracing, UNTRACED_PATHS};
pub use routes::{create_router, RouterConfig};
pub use server::{BoundServer, Server, ServerConfig};
pub use shutdown::{
    shutdown_signal, RequestGuard, ServerPhase, ShutdownCoordinator, ShutdownOutcome,
    DEFAULT_GRACE_PERIOD,
};
pub use state::AppState;
