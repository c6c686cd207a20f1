//! Configuration error types.

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The `.env` file exists but could not be read or parsed.
    #[error("Failed to load .env file: {0}")]
    DotEnv(String),

    /// A variable has a value that cannot be used.
    #[error("Invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
