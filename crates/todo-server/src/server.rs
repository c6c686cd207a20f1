//! Server lifecycle: bind, serve, and coordinated shutdown.
//!
//! The accept loop runs on a spawned task and every connection it accepts
//! runs on a task it owns. Once shutdown is triggered (OS signal or
//! [`ShutdownCoordinator::trigger`]) the listener is dropped and each
//! connection finishes its current request before closing. Connections still
//! open when the grace period elapses are aborted.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use todo_config::AppConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::shutdown::{
    shutdown_signal, track_in_flight, ServerPhase, ShutdownCoordinator, ShutdownOutcome,
    DEFAULT_GRACE_PERIOD,
};

/// Pause after a failed `accept` before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Listener and shutdown settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    pub address: String,
    /// Time allowed for in-flight requests on shutdown
    pub grace_period: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: todo_config::DEFAULT_SERVER_ADDRESS.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl ServerConfig {
    /// Create a configuration for the given address
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Take the listen address and grace period from the application config
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.server_address.clone()).with_grace_period(config.shutdown_grace_period)
    }

    /// Set the grace period
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

/// HTTP server, not yet bound
pub struct Server {
    config: ServerConfig,
    router: Router,
    coordinator: Arc<ShutdownCoordinator>,
}

impl Server {
    /// Create a server for the given router
    #[must_use]
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let coordinator = Arc::new(ShutdownCoordinator::new(config.grace_period));
        Self {
            config,
            router,
            coordinator,
        }
    }

    /// Shutdown coordinator, for programmatic shutdown and phase observation
    #[must_use]
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Bind the listener
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let listener = TcpListener::bind(&self.config.address)
            .await
            .map_err(|e| ServerError::bind(self.config.address.clone(), e))?;
        let local_addr = listener.local_addr()?;

        Ok(BoundServer {
            listener,
            local_addr,
            router: self.router,
            coordinator: self.coordinator,
        })
    }

    /// Bind, serve, and shut down on Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<ShutdownOutcome, ServerError> {
        self.bind().await?.serve_with_shutdown(shutdown_signal()).await
    }
}

/// HTTP server with a bound listener
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    coordinator: Arc<ShutdownCoordinator>,
}

impl BoundServer {
    /// Address the listener is bound to
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shutdown coordinator
    #[must_use]
    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Serve until `signal` resolves or shutdown is triggered, then drain.
    ///
    /// `signal` yields the name of whatever requested the shutdown.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<ShutdownOutcome, ServerError>
    where
        F: Future<Output = &'static str> + Send,
    {
        let Self {
            listener,
            local_addr,
            router,
            coordinator,
        } = self;

        let app = router.layer(axum::middleware::from_fn_with_state(
            coordinator.clone(),
            track_in_flight,
        ));
        let mut accept_task: JoinHandle<JoinSet<()>> =
            tokio::spawn(accept_connections(listener, app, coordinator.clone()));

        coordinator.set_phase(ServerPhase::Listening);
        info!(address = %local_addr, "Server listening");

        let finished_early = tokio::select! {
            reason = signal => {
                coordinator.trigger(reason);
                None
            }
            () = coordinator.cancelled() => None,
            joined = &mut accept_task => Some(joined),
        };
        let joined = match finished_early {
            Some(joined) => joined,
            None => accept_task.await,
        };
        let mut connections = match joined {
            Ok(connections) => connections,
            Err(e) => {
                error!(error = %e, "Accept loop failed");
                coordinator.set_phase(ServerPhase::Stopped);
                return Err(ServerError::Task(e.to_string()));
            }
        };

        let grace_period = coordinator.grace_period();
        info!(
            connections = connections.len(),
            in_flight = coordinator.in_flight_count(),
            grace_ms = u64::try_from(grace_period.as_millis()).unwrap_or(u64::MAX),
            "Waiting for in-flight requests"
        );

        let outcome = if timeout(grace_period, drain(&mut connections)).await.is_ok() {
            info!("Server stopped gracefully");
            ShutdownOutcome::Graceful
        } else {
            let remaining = coordinator.in_flight_count();
            warn!(
                remaining,
                connections = connections.len(),
                "Grace period elapsed, closing remaining connections"
            );
            connections.abort_all();
            drain(&mut connections).await;
            ShutdownOutcome::Forced { remaining }
        };

        coordinator.set_phase(ServerPhase::Stopped);
        Ok(outcome)
    }
}

/// Accept connections until shutdown is triggered.
///
/// Returns the set of connection tasks, which may still be running.
async fn accept_connections(
    listener: TcpListener,
    app: Router,
    coordinator: Arc<ShutdownCoordinator>,
) -> JoinSet<()> {
    let mut connections = JoinSet::new();

    loop {
        let accepted = tokio::select! {
            () = coordinator.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, remote_addr)) => {
                connections.spawn(serve_connection(
                    stream,
                    remote_addr,
                    app.clone(),
                    coordinator.clone(),
                ));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                tokio::select! {
                    () = coordinator.cancelled() => break,
                    () = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                }
            }
        }

        // Reap finished connections so the set only holds live ones
        while let Some(result) = connections.try_join_next() {
            log_connection_exit(result);
        }
    }

    debug!(connections = connections.len(), "Stopped accepting connections");
    connections
}

/// Serve one connection, closing it gracefully once shutdown is triggered
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    app: Router,
    coordinator: Arc<ShutdownCoordinator>,
) {
    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(app));
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = coordinator.cancelled() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };

    if let Err(e) = result {
        debug!(remote = %remote_addr, error = %e, "Connection closed with error");
    }
}

/// Wait for every connection task to finish
async fn drain(connections: &mut JoinSet<()>) {
    while let Some(result) = connections.join_next().await {
        log_connection_exit(result);
    }
}

fn log_connection_exit(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "Connection task panicked");
        }
    }
}
