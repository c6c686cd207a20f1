//! Distributed tracing setup with OpenTelemetry.
//!
//! Installs the process-wide `tracing` subscriber:
//! - an `EnvFilter` for the configured level
//! - a text or JSON `fmt` layer on stdout
//! - an OpenTelemetry layer when a span exporter is selected

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{Config, RandomIdGenerator, TracerProvider},
    Resource,
};
use todo_config::{AppConfig, LogFormat, TracingExporter};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logging::LoggingConfig;

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name (`<app>.<namespace>`)
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Deployment environment
    pub environment: String,
    /// Span exporter
    pub exporter: TracingExporter,
    /// OTLP endpoint, used with [`TracingExporter::Otlp`]
    pub otlp_endpoint: String,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "todo-api".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "local".to_string(),
            exporter: TracingExporter::Disabled,
            otlp_endpoint: todo_config::DEFAULT_OTLP_ENDPOINT.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TracingConfig {
    /// Create a new tracing configuration
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Derive tracing settings from the application configuration
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.service_name())
            .with_environment(config.environment.as_str())
            .with_exporter(config.tracing_exporter)
            .with_otlp_endpoint(config.otlp_endpoint.clone())
            .with_logging(
                LoggingConfig::new()
                    .with_level(config.log_level)
                    .with_format(config.log_format),
            )
    }

    /// Set the environment
    #[must_use]
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    /// Set the span exporter
    #[must_use]
    pub fn with_exporter(mut self, exporter: TracingExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Set the OTLP endpoint
    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the logging configuration
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    fn resource(&self) -> Resource {
        Resource::new(vec![
            KeyValue::new("service.name", self.service_name.clone()),
            KeyValue::new("service.version", self.service_version.clone()),
            KeyValue::new("deployment.environment", self.environment.clone()),
        ])
    }
}

/// Build the tracer provider for the selected exporter.
///
/// Returns `None` when span export is disabled.
pub fn build_tracer_provider(
    config: &TracingConfig,
) -> Result<Option<TracerProvider>, TelemetryError> {
    let trace_config = Config::default()
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(config.resource());

    let provider = match config.exporter {
        TracingExporter::Disabled => return Ok(None),
        TracingExporter::Console => TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_config(trace_config)
            .build(),
        TracingExporter::Otlp => build_otlp_provider(config, trace_config)?,
    };

    Ok(Some(provider))
}

#[cfg(feature = "otlp")]
fn build_otlp_provider(
    config: &TracingConfig,
    trace_config: Config,
) -> Result<TracerProvider, TelemetryError> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build_span_exporter()
        .map_err(|e| TelemetryError::OtlpConfig(e.to_string()))?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_config(trace_config)
        .build())
}

#[cfg(not(feature = "otlp"))]
fn build_otlp_provider(
    _config: &TracingConfig,
    _trace_config: Config,
) -> Result<TracerProvider, TelemetryError> {
    Err(TelemetryError::OtlpConfig(
        "built without the `otlp` feature".to_string(),
    ))
}

/// Initialize logging and tracing with the given configuration
///
/// Must be called once, from within a Tokio runtime when the OTLP exporter
/// is selected.
pub fn init_tracing(config: &TracingConfig) -> Result<TelemetryGuard, TelemetryError> {
    let provider = build_tracer_provider(config)?;

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });

    let (json_layer, text_layer) = match config.logging.format {
        LogFormat::Json => (Some(fmt::layer().json()), None),
        LogFormat::Text => (None, Some(fmt::layer().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(config.logging.env_filter())
        .with(json_layer)
        .with(text_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    if let Some(provider) = &provider {
        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());
    }

    info!(
        service = %config.service_name,
        environment = %config.environment,
        exporter = %config.exporter,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}

/// Owns the tracer provider for the lifetime of the process
#[must_use = "dropping the guard without `shutdown` may lose buffered spans"]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    /// Flush remaining spans and shut the exporter down.
    ///
    /// Blocks until the exporter acknowledges; call it from a blocking
    /// context when running inside an async runtime.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            for result in provider.force_flush() {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to flush spans");
                }
            }
            drop(provider);
            global::shutdown_tracer_provider();
            info!("Tracing shutdown complete");
        }
    }
}

/// Telemetry initialization error
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
    /// OTLP exporter could not be built
    #[error("OTLP configuration error: {0}")]
    OtlpConfig(String),
}
