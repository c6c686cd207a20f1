//! Server lifecycle integration tests
//!
//! Binding, graceful draining of in-flight requests, forced shutdown after
//! the grace period, and the single-shot shutdown trigger.

use std::time::Duration;

use todo_server::{Server, ServerConfig, ServerError, ServerPhase, ShutdownOutcome};

use crate::fixtures::*;
use crate::helpers::*;

/// Idle server shuts down gracefully
#[tokio::test]
async fn test_idle_shutdown_is_graceful() {
    let server = TestServer::start(local_config()).await;
    let coordinator = server.coordinator();
    assert_eq!(coordinator.current_phase(), ServerPhase::Listening);

    let outcome = server.shutdown().await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::Graceful);
    assert_eq!(coordinator.current_phase(), ServerPhase::Stopped);
}

/// A request in flight when shutdown starts still completes
#[tokio::test]
async fn test_in_flight_request_completes() {
    let server =
        TestServer::with_slow_route(local_config(), Duration::from_millis(300)).await;

    let request = tokio::spawn(server.client.get(server.url(SLOW_PATH)).send());
    server.wait_for_in_flight(1).await;

    let coordinator = server.coordinator();
    let outcome = server.shutdown().await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::Graceful);
    assert_eq!(coordinator.in_flight_count(), 0);

    let response = request.await.unwrap().unwrap();
    assert_status(&response, 200);
    assert_eq!(response.text().await.unwrap(), "done");
}

/// A request outliving the grace period forces the shutdown
#[tokio::test]
async fn test_slow_request_forces_shutdown() {
    let server = TestServer::with_slow_route(
        config_with_grace(Duration::from_millis(100)),
        Duration::from_secs(10),
    )
    .await;

    let request = tokio::spawn(server.client.get(server.url(SLOW_PATH)).send());
    server.wait_for_in_flight(1).await;

    let coordinator = server.coordinator();
    let outcome = server.shutdown().await.unwrap();
    assert_eq!(outcome, ShutdownOutcome::Forced { remaining: 1 });
    assert_eq!(coordinator.current_phase(), ServerPhase::Stopped);
    assert_eq!(coordinator.in_flight_count(), 0);

    // The server closed the connection instead of answering
    let result = tokio::time::timeout(Duration::from_secs(2), request)
        .await
        .expect("Request still pending after forced shutdown")
        .unwrap();
    assert!(result.is_err());
}

/// Only the first trigger starts the shutdown sequence
#[tokio::test]
async fn test_duplicate_trigger_is_noop() {
    let server = TestServer::start(local_config()).await;
    let coordinator = server.coordinator();

    assert!(coordinator.trigger("first"));
    assert!(!coordinator.trigger("second"));
    assert_eq!(coordinator.current_phase(), ServerPhase::ShuttingDown);

    let outcome = server.shutdown().await.unwrap();
    assert!(outcome.is_graceful());
}

/// The listener is closed after shutdown
#[tokio::test]
async fn test_no_connections_after_shutdown() {
    let server = TestServer::start(local_config()).await;
    let url = server.url("/api/ping");
    let client = server.client.clone();

    assert_status(&client.get(&url).send().await.unwrap(), 200);
    server.shutdown().await.unwrap();

    let result = client
        .get(&url)
        .header("Connection", "close")
        .send()
        .await;
    assert!(result.is_err());
}

/// Phases move forward only
#[tokio::test]
async fn test_phase_sequence() {
    let config = local_config();
    let server = Server::new(
        ServerConfig::from_app_config(&config),
        build_router(&config),
    );
    let coordinator = server.coordinator();
    assert_eq!(coordinator.current_phase(), ServerPhase::Created);

    let bound = server.bind().await.unwrap();
    assert_eq!(coordinator.current_phase(), ServerPhase::Created);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(bound.serve_with_shutdown(async move {
        let _ = rx.await;
        "test"
    }));

    let mut phases = coordinator.subscribe_phase();
    tokio::time::timeout(
        Duration::from_secs(5),
        phases.wait_for(|phase| *phase == ServerPhase::Listening),
    )
    .await
    .unwrap()
    .unwrap();

    tx.send(()).unwrap();
    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownOutcome::Graceful);
    assert!(coordinator.is_shutting_down());
    assert_eq!(coordinator.current_phase(), ServerPhase::Stopped);
}

/// Binding an address already in use fails
#[tokio::test]
async fn test_bind_conflict() {
    let first = TestServer::start(local_config()).await;

    let config = todo_config::AppConfig {
        server_address: first.addr.to_string(),
        ..local_config()
    };
    let result = Server::new(ServerConfig::from_app_config(&config), build_router(&config))
        .bind()
        .await;

    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
