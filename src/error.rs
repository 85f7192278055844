//! Error types for the chat server
//!
//! Separates fatal startup errors, per-session errors, registry
//! invariant violations and best-effort delivery failures.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::ConnectionId;

/// Listener-level errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listening socket (fatal at startup)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error on the listening socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a single session abnormally
#[derive(Debug, Error)]
pub enum SessionError {
    /// Registry refused the connection
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Own outbound queue closed before the greeting could be queued
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Registry invariant violations
///
/// These never occur when every session registers exactly once.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection handle is already registered
    #[error("Connection {0} is already registered")]
    DuplicateRegistration(ConnectionId),
}

/// Message delivery errors
///
/// Occurs when pushing a line into a member's outbound queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The recipient's queue is at capacity; the line was dropped
    #[error("Outbound queue full")]
    QueueFull,

    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_wraps_registry_and_send() {
        let id = ConnectionId::new();
        let err = SessionError::from(RegistryError::DuplicateRegistration(id));
        assert!(matches!(err, SessionError::Registry(_)));
        assert_eq!(err.to_string(), format!("Connection {} is already registered", id));

        let err = SessionError::from(SendError::ChannelClosed);
        assert!(matches!(err, SessionError::Send(SendError::ChannelClosed)));
        assert_eq!(err.to_string(), "Channel closed");
    }

    #[test]
    fn test_bind_error_names_address() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:8080".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:8080"));
    }
}
