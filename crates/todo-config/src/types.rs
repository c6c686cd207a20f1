//! Typed configuration values.

use std::fmt;

/// Deployment environment.
///
/// Only `local` changes behavior (CORS and API docs); every other name is
/// kept verbatim for logs and trace resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Developer workstation
    Local,
    /// Any other named environment
    Other(String),
}

impl Environment {
    /// Parse an environment name. Matching is exact.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == "local" {
            Self::Local
        } else {
            Self::Other(name.to_string())
        }
    }

    /// Whether this is the local environment
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Environment name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Debug and above
    Debug,
    /// Info and above
    #[default]
    Info,
    /// Warnings and errors
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Parse a level name case-insensitively. Unknown names fall back to `Info`.
    #[must_use]
    pub fn parse(level: &str) -> Self {
        match level.to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "WARN" => Self::Warn,
            "ERROR" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Directive understood by `tracing_subscriber::EnvFilter`
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON, anything else is text
    #[must_use]
    pub fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Where finished spans are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingExporter {
    /// No span export
    Disabled,
    /// Pretty-printed spans on stdout
    Console,
    /// OTLP over gRPC to a collector
    Otlp,
}

impl TracingExporter {
    /// `disable` and `console` are recognized exactly; any other value
    /// selects the collector exporter.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "disable" => Self::Disabled,
            "console" => Self::Console,
            _ => Self::Otlp,
        }
    }

    /// Whether spans leave the process at all
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for TracingExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disable"),
            Self::Console => write!(f, "console"),
            Self::Otlp => write!(f, "otlp"),
        }
    }
}
