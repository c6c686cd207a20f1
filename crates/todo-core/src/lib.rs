//! # Todo Core
//!
//! Core types for the Todo API.
//!
//! This crate provides the payloads shared by the server and its tests:
//! - The `Todo` resource record
//! - Health-check and error response bodies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod response;
pub mod todo;

// Re-export commonly used types
pub use response::{ErrorDetail, ErrorResponse, PingResponse};
pub use todo::Todo;

/// Version reported by the health endpoint
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
