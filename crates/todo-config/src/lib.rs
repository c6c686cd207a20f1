//! # Todo Config
//!
//! Configuration for the Todo API.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory. The loaded [`AppConfig`] is immutable and
//! handed to the telemetry and server crates at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod error;
pub mod types;

pub use app::{
    AppConfig, DEFAULT_API_KEY, DEFAULT_CORS_ORIGIN, DEFAULT_OTLP_ENDPOINT, DEFAULT_SERVER_ADDRESS,
};
pub use error::ConfigError;
pub use types::{Environment, LogFormat, LogLevel, TracingExporter};
