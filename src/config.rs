//! Server configuration

use std::time::Duration;

/// Default listen address (all interfaces, port 8080)
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default per-connection outbound queue size
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Default deadline for a single socket write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest accepted input line, in bytes (64 KiB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Default time shutdown waits for sessions to finish cleanup
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Runtime settings for a `ChatServer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub addr: String,
    /// Lines buffered per connection before new ones are dropped
    pub outbound_capacity: usize,
    /// A write slower than this disconnects the client
    pub write_timeout: Duration,
    /// Input lines longer than this end the session
    pub max_line_length: usize,
    /// How long shutdown waits for in-flight session cleanup
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    /// Default settings bound to `addr`
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}
