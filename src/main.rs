//! Line-oriented TCP Chat Server - Entry Point
//!
//! Binds the listener, installs the signal handler and runs until
//! SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (0.0.0.0:8080)
//! line_chat
//!
//! # Listen elsewhere, with a smaller per-client queue
//! line_chat 127.0.0.1:9000 --outbound-capacity 16
//!
//! # Enable debug logging
//! RUST_LOG=line_chat=debug line_chat
//! ```

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat::config::{
    DEFAULT_ADDR, DEFAULT_MAX_LINE_LENGTH, DEFAULT_OUTBOUND_CAPACITY,
};
use line_chat::{spawn_signal_listener, ChatServer, ServerConfig};

/// Broadcast chat server over plain TCP
#[derive(Parser, Debug)]
#[command(name = "line_chat", version, about)]
struct Args {
    /// Address to listen on
    #[arg(default_value = DEFAULT_ADDR)]
    addr: String,

    /// Lines buffered per client before new ones are dropped
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// Disconnect a client whose socket write takes longer than this
    #[arg(long, default_value_t = 5000)]
    write_timeout_ms: u64,

    /// Longest accepted input line in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// How long shutdown waits for sessions to say goodbye
    #[arg(long, default_value_t = 2000)]
    shutdown_grace_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            outbound_capacity: args.outbound_capacity,
            write_timeout: Duration::from_millis(args.write_timeout_ms),
            max_line_length: args.max_line_length,
            shutdown_grace: Duration::from_millis(args.shutdown_grace_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = ServerConfig::from(Args::parse());

    // Bind failure is fatal
    let server = ChatServer::bind(config).await?;
    spawn_signal_listener(server.shutdown_token());

    let report = server.run().await?;
    info!(
        "Exiting ({} connection(s) closed, cleanup {})",
        report.closed,
        if report.drained { "complete" } else { "incomplete" }
    );

    Ok(())
}
