//! # Todo Telemetry
//!
//! Observability for the Todo API.
//!
//! This crate provides:
//! - Leveled, text or JSON structured logging to stdout
//! - Distributed tracing with OpenTelemetry (console or OTLP export)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod tracing_setup;

// Re-export main types
pub use logging::LoggingConfig;
pub use tracing_setup::{
    build_tracer_provider, init_tracing, TelemetryError, TelemetryGuard, TracingConfig,
};
