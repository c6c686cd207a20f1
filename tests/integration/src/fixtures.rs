//! Test fixtures: configurations and expected payloads

use std::time::Duration;

use todo_config::{AppConfig, Environment};

/// API key accepted by servers built from [`local_config`]
pub const TEST_API_KEY: &str = "123456";

/// Origin allowed by CORS in the local environment
pub const TEST_ORIGIN: &str = "http://localhost:4200";

/// Exact body of the sample todo
pub const SAMPLE_TODO_JSON: &str =
    r#"{"id":1,"title":"Prueba","description":"Prueba","completed":false}"#;

/// Local configuration on an ephemeral loopback port
pub fn local_config() -> AppConfig {
    AppConfig {
        server_address: "127.0.0.1:0".to_string(),
        shutdown_grace_period: Duration::from_secs(2),
        ..AppConfig::default()
    }
}

/// Non-local configuration: no CORS, no docs
pub fn production_config() -> AppConfig {
    AppConfig {
        environment: Environment::parse("production"),
        ..local_config()
    }
}

/// Local configuration with a custom grace period
pub fn config_with_grace(grace_period: Duration) -> AppConfig {
    AppConfig {
        shutdown_grace_period: grace_period,
        ..local_config()
    }
}
