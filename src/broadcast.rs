//! Broadcaster
//!
//! Fans an event out to every registered connection except its sender.
//! The registry lock is held only while copying the recipient list;
//! delivery itself is a non-blocking push into each recipient's queue.

use tracing::{debug, warn};

use crate::error::SendError;
use crate::message::ChatEvent;
use crate::registry::Registry;
use crate::types::ConnectionId;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose queue accepted the line
    pub delivered: usize,
    /// Recipients for whom the line was dropped
    pub dropped: usize,
}

/// Delivers chat events to the members of a registry
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Registry,
}

impl Broadcaster {
    /// Create a broadcaster over the given registry
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Deliver `event` to everyone except `sender`
    ///
    /// Best-effort: a failure for one recipient is logged and the rest
    /// still receive the line. Nothing is retried.
    pub async fn broadcast(&self, sender: ConnectionId, event: &ChatEvent) -> Delivery {
        let recipients = self.registry.snapshot(sender).await;
        let line = event.render();
        let mut delivery = Delivery::default();

        for recipient in recipients {
            match recipient.outbox.try_deliver(line.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(SendError::QueueFull) => {
                    warn!(
                        "Dropping message for {} ({}): outbound queue full",
                        recipient.label, recipient.id
                    );
                    delivery.dropped += 1;
                }
                Err(SendError::ChannelClosed) => {
                    debug!(
                        "Skipping {} ({}): connection is closing",
                        recipient.label, recipient.id
                    );
                    delivery.dropped += 1;
                }
            }
        }

        delivery
    }
}
