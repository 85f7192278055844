//! Shutdown coordination
//!
//! A termination signal raises the process-wide shutdown event. The
//! coordinator then force-closes every registered connection and waits,
//! up to a grace period, for the sessions to finish their own cleanup.
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: graceful shutdown (Ctrl+C on non-unix targets)

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::registry::Registry;

/// What a shutdown pass accomplished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Connections force-closed by the pass
    pub closed: usize,
    /// Whether every session finished cleanup within the grace period
    pub drained: bool,
}

/// Closes all connections and supervises session cleanup
pub struct ShutdownCoordinator {
    registry: Registry,
    sessions: TaskTracker,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(registry: Registry, sessions: TaskTracker, grace: Duration) -> Self {
        Self {
            registry,
            sessions,
            grace,
        }
    }

    /// Force-close every registered connection, then wait for cleanups
    ///
    /// With a zero grace period this returns as soon as the connections
    /// are closed, without waiting for the sessions.
    pub async fn shutdown(self) -> ShutdownReport {
        let closed = self.registry.close_all().await;
        info!("Closed {} active connection(s)", closed);

        self.sessions.close();

        let drained = if self.grace.is_zero() {
            self.sessions.is_empty()
        } else {
            timeout(self.grace, self.sessions.wait()).await.is_ok()
        };

        if !drained {
            warn!(
                "{} session(s) still cleaning up after {:?}",
                self.sessions.len(),
                self.grace
            );
        }

        ShutdownReport { closed, drained }
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

/// Raise `token` when the process is asked to terminate
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
            return;
        }
        info!("Shutting down server...");
        token.cancel();
    })
}
