//! Registry member definition
//!
//! Represents a connected client as seen by everyone except its own
//! session: a display label, a handle to its outbound queue, and a
//! handle that force-closes the connection.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SendError;

/// Sending side of a connection's bounded outbound queue
///
/// Lines pushed here are written to the socket, in order, by the
/// session's writer task.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::Sender<String>,
}

impl Outbox {
    /// Create an outbox and the receiver its writer task drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queue a line without waiting
    ///
    /// Fails with `QueueFull` when the recipient is not keeping up; the
    /// line is dropped for that recipient.
    pub fn try_deliver(&self, line: String) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Queue a line, waiting for capacity
    ///
    /// Only the owning session uses this, for its own greeting and goodbye.
    pub async fn send(&self, line: String) -> Result<(), SendError> {
        self.sender
            .send(line)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Check whether the writer task has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Connected client information held by the registry
#[derive(Debug, Clone)]
pub struct Member {
    /// Display label (the remote address)
    pub label: String,
    /// Server → Client line queue
    pub outbox: Outbox,
    /// Cancelling this closes the connection from outside its session
    pub closer: CancellationToken,
}

impl Member {
    /// Create a member entry for a connection
    pub fn new(label: impl Into<String>, outbox: Outbox, closer: CancellationToken) -> Self {
        Self {
            label: label.into(),
            outbox,
            closer,
        }
    }

    /// Force-close the connection
    ///
    /// Idempotent; the owning session observes it as a failed read.
    pub fn close(&self) {
        self.closer.cancel();
    }

    /// Check if the connection has been force-closed
    pub fn is_closed(&self) -> bool {
        self.closer.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_delivers_in_order() {
        let (outbox, mut rx) = Outbox::channel(4);

        outbox.try_deliver("one".to_string()).unwrap();
        outbox.send("two".to_string()).await.unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_outbox_full_drops() {
        let (outbox, _rx) = Outbox::channel(1);

        outbox.try_deliver("first".to_string()).unwrap();
        assert_eq!(
            outbox.try_deliver("second".to_string()),
            Err(SendError::QueueFull)
        );
    }

    #[tokio::test]
    async fn test_outbox_closed() {
        let (outbox, rx) = Outbox::channel(4);
        drop(rx);

        assert!(outbox.is_closed());
        assert_eq!(
            outbox.try_deliver("late".to_string()),
            Err(SendError::ChannelClosed)
        );
        assert_eq!(
            outbox.send("late".to_string()).await,
            Err(SendError::ChannelClosed)
        );
    }

    #[test]
    fn test_member_close() {
        let (outbox, _rx) = Outbox::channel(4);
        let member = Member::new("127.0.0.1:1", outbox, CancellationToken::new());

        assert!(!member.is_closed());
        member.close();
        member.close();
        assert!(member.is_closed());
    }
}
