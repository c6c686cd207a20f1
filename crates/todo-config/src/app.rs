//! Application configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, Result};
use crate::types::{Environment, LogFormat, LogLevel, TracingExporter};

/// Default listen address
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";

/// Default shared secret for `X-API-KEY`
pub const DEFAULT_API_KEY: &str = "123456";

/// Origin allowed by CORS in the local environment
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Default OTLP gRPC collector
pub const DEFAULT_OTLP_ENDPOINT: &str =
    "http://jaeger-collector.observability.svc.cluster.local:4317";

const DEFAULT_GRACE_SECONDS: u64 = 5;

/// Todo API configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment (`ENVIRONMENT`)
    pub environment: Environment,
    /// Listen address (`SERVER_ADDRESS`)
    pub server_address: String,
    /// Minimum log level (`LOG_LEVEL`)
    pub log_level: LogLevel,
    /// Log format (`LOG_FORMAT`)
    pub log_format: LogFormat,
    /// Kubernetes namespace (`POD_NAMESPACE`)
    pub pod_namespace: String,
    /// Application name (`APP_NAME`)
    pub app_name: String,
    /// Span exporter (`USE_TRACING_EXPORTER`)
    pub tracing_exporter: TracingExporter,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`)
    pub otlp_endpoint: String,
    /// Shared secret expected in `X-API-KEY` (`API_KEY`)
    pub api_key: SecretString,
    /// Time allowed for in-flight requests on shutdown (`SHUTDOWN_GRACE_SECONDS`)
    pub shutdown_grace_period: Duration,
    /// Origin allowed by CORS in local (`CORS_ALLOWED_ORIGIN`)
    pub cors_allowed_origin: String,
    /// `.env` file that seeded the environment, if any
    pub env_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            pod_namespace: "default".to_string(),
            app_name: "todo-api".to_string(),
            tracing_exporter: TracingExporter::Disabled,
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            api_key: SecretString::new(DEFAULT_API_KEY.to_string()),
            shutdown_grace_period: Duration::from_secs(DEFAULT_GRACE_SECONDS),
            cors_allowed_origin: DEFAULT_CORS_ORIGIN.to_string(),
            env_file: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) into the process environment, then read the
    /// configuration from it.
    pub fn load() -> Result<Self> {
        let env_file = match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(e) if e.not_found() => None,
            Err(e) => return Err(ConfigError::DotEnv(e.to_string())),
        };

        let mut config = Self::from_env()?;
        config.env_file = env_file;
        Ok(config)
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let shutdown_grace_period = match lookup("SHUTDOWN_GRACE_SECONDS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::invalid("SHUTDOWN_GRACE_SECONDS", format!("{raw:?}: {e}"))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.shutdown_grace_period,
        };

        let config = Self {
            environment: lookup("ENVIRONMENT")
                .map_or(defaults.environment, |v| Environment::parse(&v)),
            server_address: lookup("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            log_level: lookup("LOG_LEVEL").map_or(defaults.log_level, |v| LogLevel::parse(&v)),
            log_format: lookup("LOG_FORMAT").map_or(defaults.log_format, |v| LogFormat::parse(&v)),
            pod_namespace: lookup("POD_NAMESPACE").unwrap_or(defaults.pod_namespace),
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            tracing_exporter: lookup("USE_TRACING_EXPORTER")
                .map_or(defaults.tracing_exporter, |v| TracingExporter::parse(&v)),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            api_key: lookup("API_KEY").map_or(defaults.api_key, SecretString::new),
            shutdown_grace_period,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or(defaults.cors_allowed_origin),
            env_file: None,
        };

        config.validate()?;
        Ok(config)
    }

    /// Semantic checks on top of parsing.
    ///
    /// An empty API key is rejected: a missing header is compared as the empty
    /// string and must never be authorized.
    pub fn validate(&self) -> Result<()> {
        if self.server_address.trim().is_empty() {
            return Err(ConfigError::invalid("SERVER_ADDRESS", "must not be empty"));
        }
        if self.api_key.expose_secret().is_empty() {
            return Err(ConfigError::invalid("API_KEY", "must not be empty"));
        }
        if self.environment.is_local() && self.cors_allowed_origin.trim().is_empty() {
            return Err(ConfigError::invalid(
                "CORS_ALLOWED_ORIGIN",
                "must not be empty in the local environment",
            ));
        }
        Ok(())
    }

    /// Service name reported to the tracing backend: `<app>.<namespace>`
    #[must_use]
    pub fn service_name(&self) -> String {
        format!("{}.{}", self.app_name, self.pod_namespace)
    }
}
