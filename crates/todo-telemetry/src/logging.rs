//! Structured logging settings.

use todo_config::{LogFormat, LogLevel};
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConfig {
    /// Minimum level, overridden by `RUST_LOG` when set
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Create a logging configuration with defaults (info, text)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Filter built from `RUST_LOG`, falling back to the configured level
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| self.default_filter())
    }

    fn default_filter(&self) -> EnvFilter {
        EnvFilter::new(self.level.as_filter())
    }
}
