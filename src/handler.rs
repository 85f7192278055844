//! TCP session handler
//!
//! Drives one client connection through its lifecycle: greeting,
//! registration, the line-reading loop, and a single cleanup path shared
//! by `Exit`, end of stream, read errors and forced closes.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::Broadcaster;
use crate::client::{Member, Outbox};
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::message::{self, ChatEvent, ClientCommand, GOODBYE, LINE_TERMINATOR};
use crate::registry::Registry;
use crate::types::ConnectionId;

/// Everything a session shares with the rest of the server
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub registry: Registry,
    pub broadcaster: Broadcaster,
    /// Process-wide shutdown event
    pub shutdown: CancellationToken,
    pub config: Arc<ServerConfig>,
}

impl SessionContext {
    pub fn new(registry: Registry, shutdown: CancellationToken, config: Arc<ServerConfig>) -> Self {
        Self {
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            shutdown,
            config,
        }
    }
}

/// Why a session left its read loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    ExitCommand,
    EndOfStream,
    ReadError,
    ForcedClose,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            CloseReason::ExitCommand => "exit command",
            CloseReason::EndOfStream => "end of stream",
            CloseReason::ReadError => "read error",
            CloseReason::ForcedClose => "closed by server",
        };
        f.write_str(reason)
    }
}

/// Handle a new TCP connection
///
/// Returns once the client is unregistered and its departure has been
/// broadcast. Only a registry invariant violation is reported as an error.
pub async fn handle_connection(stream: TcpStream, ctx: SessionContext) -> Result<(), SessionError> {
    let label = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let id = ConnectionId::new();

    debug!("New TCP connection from {} ({})", label, id);

    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(
        read_half,
        AnyDelimiterCodec::new_with_max_length(
            b"\n".to_vec(),
            Vec::new(),
            ctx.config.max_line_length,
        ),
    );

    let (outbox, outbound) = Outbox::channel(ctx.config.outbound_capacity);
    let closer = CancellationToken::new();

    // Queued before registration so it precedes anything broadcast to us
    outbox.send(message::welcome(&label)).await?;

    let member = Member::new(label.clone(), outbox.clone(), closer.clone());
    if let Err(e) = ctx.registry.register(id, member).await {
        error!("Failed to register client {}: {}", label, e);
        return Err(e.into());
    }

    // Registered after the shutdown pass went over the registry: close ourselves
    if ctx.shutdown.is_cancelled() {
        closer.cancel();
    }

    let writer = tokio::spawn(write_lines(
        write_half,
        outbound,
        closer.clone(),
        ctx.config.write_timeout,
        label.clone(),
    ));

    info!("Client {} connected", label);
    ctx.broadcaster
        .broadcast(id, &ChatEvent::Joined { label: label.clone() })
        .await;

    let reason = loop {
        tokio::select! {
            biased;

            _ = closer.cancelled() => break CloseReason::ForcedClose,

            frame = lines.next() => match frame {
                Some(Ok(line)) => match ClientCommand::parse(&line) {
                    ClientCommand::Exit => {
                        if outbox.send(GOODBYE.to_string()).await.is_err() {
                            debug!("Writer for {} already gone, skipping goodbye", label);
                        }
                        break CloseReason::ExitCommand;
                    }
                    ClientCommand::Say(text) => {
                        let event = ChatEvent::Chat { from: label.clone(), text };
                        info!("{}", event.render());
                        ctx.broadcaster.broadcast(id, &event).await;
                    }
                },
                Some(Err(e)) => {
                    debug!("Error reading from client {}: {}", label, e);
                    break CloseReason::ReadError;
                }
                None => break CloseReason::EndOfStream,
            }
        }
    };

    // Closing: runs exactly once whichever branch got us here
    ctx.registry.unregister(id).await;
    drop(outbox);

    // The writer drains what is queued (Bye! included) and closes the socket
    if let Err(e) = writer.await {
        warn!("Write task for {} failed: {}", label, e);
    }
    drop(lines);

    info!("Client {} disconnected ({})", label, reason);
    ctx.broadcaster
        .broadcast(id, &ChatEvent::Left { label })
        .await;

    Ok(())
}

/// Drain a connection's outbound queue onto the socket
///
/// Ends when every `Outbox` is dropped or the connection is force-closed.
/// A failed or overdue write force-closes the connection.
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<String>,
    closer: CancellationToken,
    write_timeout: Duration,
    label: String,
) {
    loop {
        let line = tokio::select! {
            biased;

            _ = closer.cancelled() => break,

            line = outbound.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let mut bytes = line.into_bytes();
        bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());

        match timeout(write_timeout, writer.write_all(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Error writing to client {}: {}", label, e);
                closer.cancel();
                break;
            }
            Err(_) => {
                warn!(
                    "Write to client {} timed out after {:?}, disconnecting",
                    label, write_timeout
                );
                closer.cancel();
                break;
            }
        }
    }

    match timeout(write_timeout, writer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Error shutting down connection to {}: {}", label, e),
        Err(_) => debug!("Shutdown of connection to {} timed out", label),
    }
    debug!("Write task ended for {}", label);
}
