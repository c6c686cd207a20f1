//! # Todo API
//!
//! Minimal HTTP backend serving a liveness probe and an API-key protected
//! todo resource.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults (local environment, 0.0.0.0:8080)
//! todo-api
//!
//! # Production-like settings
//! ENVIRONMENT=production LOG_FORMAT=json USE_TRACING_EXPORTER=otlp todo-api
//! ```
//!
//! Settings are read from the environment and from `./.env` when present.

use todo_config::AppConfig;
use todo_server::{
    create_router, ApiKeyGate, AppState, RouterConfig, Server, ServerConfig, ServerError,
    ShutdownOutcome,
};
use todo_telemetry::{init_tracing, TracingConfig};
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let telemetry = match init_tracing(&TracingConfig::from_app_config(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {e}");
            std::process::exit(1);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        env_file = ?config.env_file,
        "Starting Todo API"
    );

    let result = run(&config).await;
    match &result {
        Ok(ShutdownOutcome::Graceful) => info!("Shutdown complete"),
        Ok(ShutdownOutcome::Forced { remaining }) => {
            error!(remaining, "Server forced to shut down, in-flight requests were dropped");
        }
        Err(e) => error!(error = %e, "Application failed"),
    }
    let code = exit_code(&result);

    if let Err(e) = tokio::task::spawn_blocking(move || telemetry.shutdown()).await {
        eprintln!("Failed to flush telemetry: {e}");
    }

    std::process::exit(code);
}

/// Build the router and serve until shutdown
async fn run(config: &AppConfig) -> Result<ShutdownOutcome, ServerError> {
    let state = AppState::new(ApiKeyGate::new(config.api_key.clone()));
    let router_config = RouterConfig::from_app_config(config)?;
    let router = create_router(state, &router_config);

    let server = Server::new(ServerConfig::from_app_config(config), router).bind().await?;

    let url = format!("http://{}", server.local_addr());
    if router_config.docs_enabled {
        info!(
            url = %url,
            docs = %format!("{url}/api/swagger/"),
            "Server started"
        );
    } else {
        info!(url = %url, "Server started");
    }

    server.serve_with_shutdown(todo_server::shutdown_signal()).await
}

/// Process exit code for how the server ended
fn exit_code(result: &Result<ShutdownOutcome, ServerError>) -> i32 {
    match result {
        Ok(ShutdownOutcome::Graceful) => 0,
        Ok(ShutdownOutcome::Forced { .. }) | Err(_) => 1,
    }
}
