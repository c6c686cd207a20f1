//! Test helper utilities for integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::Value;
use todo_config::AppConfig;
use todo_server::{
    create_router, ApiKeyGate, AppState, RouterConfig, Server, ServerConfig, ServerError,
    ShutdownCoordinator, ShutdownOutcome,
};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Path of the slow route added by [`TestServer::with_slow_route`]
pub const SLOW_PATH: &str = "/test/slow";

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Build the production router for a configuration
pub fn build_router(config: &AppConfig) -> Router {
    let state = AppState::new(ApiKeyGate::new(config.api_key.clone()));
    let router_config = RouterConfig::from_app_config(config).expect("Invalid router config");
    create_router(state, &router_config)
}

/// A real server running on an ephemeral port
pub struct TestServer {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    coordinator: Arc<ShutdownCoordinator>,
    handle: Option<JoinHandle<Result<ShutdownOutcome, ServerError>>>,
}

impl TestServer {
    /// Start a server for the given configuration
    pub async fn start(config: AppConfig) -> Self {
        let router = build_router(&config);
        Self::start_with_router(&config, router).await
    }

    /// Start a server whose router also has a [`SLOW_PATH`] route that
    /// sleeps for `delay` before answering `done`
    pub async fn with_slow_route(config: AppConfig, delay: Duration) -> Self {
        let router = build_router(&config).route(
            SLOW_PATH,
            get(move || async move {
                tokio::time::sleep(delay).await;
                "done"
            }),
        );
        Self::start_with_router(&config, router).await
    }

    /// Start a server with an arbitrary router
    pub async fn start_with_router(config: &AppConfig, router: Router) -> Self {
        init_tracing();

        let bound = Server::new(ServerConfig::from_app_config(config), router)
            .bind()
            .await
            .expect("Failed to bind");
        let addr = bound.local_addr();
        let coordinator = bound.coordinator();

        // Only programmatic shutdown; OS signals belong to the test harness
        let handle = tokio::spawn(bound.serve_with_shutdown(std::future::pending()));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create client");

        let server = Self {
            addr,
            client,
            base_url: format!("http://{addr}"),
            coordinator,
            handle: Some(handle),
        };
        server.wait_until_listening().await;
        server
    }

    async fn wait_until_listening(&self) {
        let mut phases = self.coordinator.subscribe_phase();
        tokio::time::timeout(
            Duration::from_secs(5),
            phases.wait_for(|phase| *phase != todo_server::ServerPhase::Created),
        )
        .await
        .expect("Server did not start")
        .expect("Phase channel closed");
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Shutdown coordinator of the running server
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a GET request with headers
    pub async fn get_with_headers(&self, path: &str, headers: Vec<(&str, &str)>) -> Response {
        let mut builder = self.client.get(self.url(path));
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.send().await.expect("Request failed")
    }

    /// Make a CORS preflight request
    pub async fn preflight(&self, path: &str, origin: &str) -> Response {
        self.client
            .request(reqwest::Method::OPTIONS, self.url(path))
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "GET")
            .header("Access-Control-Request-Headers", "x-api-key")
            .send()
            .await
            .expect("Request failed")
    }

    /// Parse response body as JSON
    pub async fn json_body(response: Response) -> Value {
        response.json().await.expect("Failed to parse JSON")
    }

    /// Wait until `count` requests are in flight
    pub async fn wait_for_in_flight(&self, count: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.coordinator.in_flight_count() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Requests never became in flight");
    }

    /// Trigger shutdown and wait for the serve loop to finish
    pub async fn shutdown(mut self) -> Result<ShutdownOutcome, ServerError> {
        self.coordinator.trigger("test shutdown");
        self.handle
            .take()
            .expect("Server already shut down")
            .await
            .expect("Server task panicked")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.coordinator.trigger("test server dropped");
    }
}

/// Assert that a response has the expected status code
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}
