//! Connection registry
//!
//! The single source of truth for who is currently connected. The map is
//! private; every access goes through `register`, `unregister`,
//! `snapshot` and `close_all`, which are mutually exclusive.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::client::{Member, Outbox};
use crate::error::RegistryError;
use crate::types::ConnectionId;

/// One recipient in a point-in-time snapshot
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ConnectionId,
    pub label: String,
    pub outbox: Outbox,
}

/// Shared registry of active connections
///
/// Cheap to clone; all clones refer to the same table.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    members: Arc<Mutex<HashMap<ConnectionId, Member>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection
    ///
    /// A second registration of the same handle is an invariant violation
    /// and leaves the existing entry untouched.
    pub async fn register(&self, id: ConnectionId, member: Member) -> Result<(), RegistryError> {
        let mut members = self.members.lock().await;
        if members.contains_key(&id) {
            return Err(RegistryError::DuplicateRegistration(id));
        }
        members.insert(id, member);
        debug!("Registered {} (total: {})", id, members.len());
        Ok(())
    }

    /// Remove a connection if present
    ///
    /// Returns the removed entry, or `None` if it was already gone.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Member> {
        let mut members = self.members.lock().await;
        let removed = members.remove(&id);
        if removed.is_some() {
            debug!("Unregistered {} (total: {})", id, members.len());
        }
        removed
    }

    /// Copy every recipient except `excluding`, under one lock acquisition
    pub async fn snapshot(&self, excluding: ConnectionId) -> Vec<Recipient> {
        let members = self.members.lock().await;
        members
            .iter()
            .filter(|(id, _)| **id != excluding)
            .map(|(id, member)| Recipient {
                id: *id,
                label: member.label.clone(),
                outbox: member.outbox.clone(),
            })
            .collect()
    }

    /// Force-close every registered connection
    ///
    /// Entries stay in place; each session removes its own on the way out.
    /// Returns the number of connections that were closed by this call.
    pub async fn close_all(&self) -> usize {
        let members = self.members.lock().await;
        let mut closed = 0;
        for member in members.values() {
            if !member.is_closed() {
                member.close();
                closed += 1;
            }
        }
        closed
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Check if nobody is connected
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    /// Check if a connection is registered
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().await.contains_key(&id)
    }

    /// Labels of every registered connection, sorted
    pub async fn labels(&self) -> Vec<String> {
        let members = self.members.lock().await;
        let mut labels: Vec<String> = members.values().map(|m| m.label.clone()).collect();
        labels.sort();
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn member(label: &str) -> Member {
        let (outbox, _rx) = Outbox::channel(8);
        Member::new(label, outbox, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let registry = Registry::new();
        let id = ConnectionId::new();

        registry.register(id, member("a")).await.unwrap();
        assert!(registry.contains(id).await);
        assert_eq!(registry.len().await, 1);

        let removed = registry.unregister(id).await;
        assert_eq!(removed.map(|m| m.label), Some("a".to_string()));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = Registry::new();
        let id = ConnectionId::new();

        registry.register(id, member("first")).await.unwrap();
        let result = registry.register(id, member("second")).await;

        assert_eq!(result, Err(RegistryError::DuplicateRegistration(id)));
        assert_eq!(registry.labels().await, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = Registry::new();
        let gone = ConnectionId::new();
        let other = ConnectionId::new();

        registry.register(gone, member("gone")).await.unwrap();
        registry.register(other, member("other")).await.unwrap();

        assert!(registry.unregister(gone).await.is_some());
        assert!(registry.unregister(gone).await.is_none());
        assert!(registry.unregister(ConnectionId::new()).await.is_none());

        // The other entry is untouched
        assert!(registry.contains(other).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_excludes_sender() {
        let registry = Registry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();

        registry.register(a, member("a")).await.unwrap();
        registry.register(b, member("b")).await.unwrap();
        registry.register(c, member("c")).await.unwrap();

        let mut labels: Vec<String> = registry
            .snapshot(a)
            .await
            .into_iter()
            .map(|r| r.label)
            .collect();
        labels.sort();
        assert_eq!(labels, vec!["b".to_string(), "c".to_string()]);

        // Snapshot is a copy: later mutations do not affect it
        let snapshot = registry.snapshot(a).await;
        registry.unregister(b).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.snapshot(a).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cardinality() {
        let registry = Registry::new();
        let total = 200;
        let leaving = 120;

        let mut handles = Vec::new();
        for i in 0..total {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let id = ConnectionId::new();
                registry.register(id, member(&format!("c{}", i))).await.unwrap();
                if i < leaving {
                    tokio::task::yield_now().await;
                    assert!(registry.unregister(id).await.is_some());
                    // Racing second removal, as shutdown would
                    assert!(registry.unregister(id).await.is_none());
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.len().await, total - leaving);
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = Registry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let token_a = CancellationToken::new();
        let token_b = CancellationToken::new();

        let (outbox, _rx_a) = Outbox::channel(8);
        registry
            .register(a, Member::new("a", outbox, token_a.clone()))
            .await
            .unwrap();
        let (outbox, _rx_b) = Outbox::channel(8);
        registry
            .register(b, Member::new("b", outbox, token_b.clone()))
            .await
            .unwrap();

        assert_eq!(registry.close_all().await, 2);
        assert!(token_a.is_cancelled());
        assert!(token_b.is_cancelled());

        // Entries remain until their sessions unregister
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.close_all().await, 0);
    }
}
