//! Graceful shutdown handling for the Todo API.
//!
//! Provides shutdown coordination including:
//! - A single, idempotent shutdown trigger
//! - Lifecycle phase broadcasting
//! - In-flight request tracking
//! - OS signal handling (Ctrl+C, SIGTERM)

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Time allowed for in-flight requests once shutdown starts
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Server lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    /// Constructed, not yet accepting connections
    Created,
    /// Accepting connections
    Listening,
    /// No longer accepting; in-flight requests draining
    ShuttingDown,
    /// Serve loop finished or aborted
    Stopped,
}

impl std::fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Listening => write!(f, "listening"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// How the shutdown sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request finished within the grace period
    Graceful,
    /// The grace period elapsed and the remaining connections were closed
    Forced {
        /// Requests still running when the connections were closed
        remaining: u64,
    },
}

impl ShutdownOutcome {
    /// Whether shutdown completed without aborting requests
    #[must_use]
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::Graceful)
    }
}

/// Shutdown coordinator shared between the server, its middleware and
/// whoever requests the shutdown.
pub struct ShutdownCoordinator {
    grace_period: Duration,
    token: CancellationToken,
    triggered: AtomicBool,
    phase: watch::Sender<ServerPhase>,
    in_flight: AtomicU64,
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("grace_period", &self.grace_period)
            .field("phase", &self.current_phase())
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator with the given grace period
    #[must_use]
    pub fn new(grace_period: Duration) -> Self {
        let (phase, _) = watch::channel(ServerPhase::Created);
        Self {
            grace_period,
            token: CancellationToken::new(),
            triggered: AtomicBool::new(false),
            phase,
            in_flight: AtomicU64::new(0),
        }
    }

    /// Create with the default grace period
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }

    /// Grace period for in-flight requests
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Get current lifecycle phase
    #[must_use]
    pub fn current_phase(&self) -> ServerPhase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes
    #[must_use]
    pub fn subscribe_phase(&self) -> watch::Receiver<ServerPhase> {
        self.phase.subscribe()
    }

    /// Check if shutdown has been triggered
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Get the number of in-flight requests
    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Future resolving once shutdown is triggered
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.token.clone().cancelled_owned()
    }

    /// Trigger shutdown with a reason.
    ///
    /// Returns `false` when shutdown was already triggered; only the first
    /// caller starts the sequence.
    pub fn trigger(&self, reason: &str) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(reason = %reason, "Shutdown already triggered");
            return false;
        }

        info!(reason = %reason, "Initiating graceful shutdown");
        self.set_phase(ServerPhase::ShuttingDown);
        self.token.cancel();
        true
    }

    pub(crate) fn set_phase(&self, phase: ServerPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            info!(from = %previous, to = %phase, "Server phase changed");
        }
    }

    pub(crate) fn request_start(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn request_complete(&self) {
        let prev = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug!(in_flight = prev.saturating_sub(1), "Request completed");
    }
}

/// Counts a request as in flight until dropped
pub struct RequestGuard {
    coordinator: Arc<ShutdownCoordinator>,
}

impl RequestGuard {
    /// Register a request start
    #[must_use]
    pub fn new(coordinator: Arc<ShutdownCoordinator>) -> Self {
        coordinator.request_start();
        Self { coordinator }
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.coordinator.request_complete();
    }
}

/// Middleware holding a [`RequestGuard`] for the duration of each request
pub async fn track_in_flight(
    State(coordinator): State<Arc<ShutdownCoordinator>>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = RequestGuard::new(coordinator);
    next.run(request).await
}

/// Wait for Ctrl+C or SIGTERM and return the signal name.
///
/// A handler that fails to install is logged and never fires; the other one
/// still does.
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        "ctrl+c"
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
        "sigterm"
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<&'static str>();

    let signal_name = tokio::select! {
        name = ctrl_c => name,
        name = sigterm => name,
    };

    info!(signal = signal_name, "Received shutdown signal");
    signal_name
}
