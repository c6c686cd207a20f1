//! Integration tests for the Todo API
//!
//! Every test runs against a real listener bound to an ephemeral port:
//! - API endpoint behavior (ping, todos, docs, CORS)
//! - Server lifecycle and graceful shutdown

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;

#[cfg(test)]
mod lifecycle_tests;
