//! ChatServer listener
//!
//! Owns the listening socket, the connection registry and the process-wide
//! shutdown event. Each accepted connection runs as its own supervised
//! session task; the accept loop never waits on a session.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{handle_connection, SessionContext};
use crate::registry::Registry;
use crate::shutdown::{ShutdownCoordinator, ShutdownReport};

/// The chat server
pub struct ChatServer {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    registry: Registry,
    shutdown: CancellationToken,
    sessions: TaskTracker,
}

impl ChatServer {
    /// Bind the listening socket
    ///
    /// A bind failure is fatal: the server cannot start.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.addr.clone(),
                source,
            })?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            registry: Registry::new(),
            shutdown: CancellationToken::new(),
            sessions: TaskTracker::new(),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the connection registry
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the accept loop until the shutdown token fires
    ///
    /// Then closes every connection and waits up to the configured grace
    /// period for sessions to finish their cleanup.
    pub async fn run(self) -> Result<ShutdownReport, ServerError> {
        info!("Chat server listening on {}", self.local_addr()?);

        let ctx = SessionContext::new(
            self.registry.clone(),
            self.shutdown.clone(),
            Arc::clone(&self.config),
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("Accepted connection from {}", addr);
                            let ctx = ctx.clone();
                            self.sessions.spawn(async move {
                                if let Err(e) = handle_connection(stream, ctx).await {
                                    error!("Connection handler error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            // Existing sessions are unaffected; keep accepting
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        // Stop accepting before tearing sessions down
        drop(self.listener);

        let coordinator =
            ShutdownCoordinator::new(self.registry, self.sessions, self.config.shutdown_grace);
        let report = coordinator.shutdown().await;

        info!(
            "Chat server stopped (closed: {}, drained: {})",
            report.closed, report.drained
        );
        Ok(report)
    }
}
