//! Registry of open connections.
//!
//! Connections are indexed by [`ConnectionId`]. The registry also tracks the
//! *active* connection: the most recently accepted one that is still open.
//! When the active connection closes, the newest remaining one takes over.

use std::collections::HashMap;

use tokio::sync::{watch, RwLock};

use crate::error::{MockSocketError, Result};
use crate::transport::{ConnectionId, PeerSender};

/// Open connections, shared between the accept loop, the per-connection
/// tasks and the push paths.
pub(crate) struct ConnectionRegistry {
    /// Write handles indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, PeerSender>>,
    /// Currently active connection. Only updated under the write lock.
    active: watch::Sender<Option<ConnectionId>>,
}

impl ConnectionRegistry {
    pub(crate) fn new() -> Self {
        let (active, _) = watch::channel(None);
        Self {
            connections: RwLock::new(HashMap::new()),
            active,
        }
    }

    /// Register a connection and make it the active one.
    pub(crate) async fn add(&self, sender: PeerSender) {
        let mut conns = self.connections.write().await;
        let id = sender.id();
        let _ = conns.insert(id, sender);
        let _ = self.active.send_replace(Some(id));
    }

    /// Remove a connection. Returns whether it was registered.
    pub(crate) async fn remove(&self, id: ConnectionId) -> bool {
        let mut conns = self.connections.write().await;
        let removed = conns.remove(&id).is_some();
        if self.active() == Some(id) {
            let newest = conns.keys().max().copied();
            let _ = self.active.send_replace(newest);
        }
        removed
    }

    /// Drop every connection.
    pub(crate) async fn clear(&self) {
        let mut conns = self.connections.write().await;
        conns.clear();
        let _ = self.active.send_replace(None);
    }

    pub(crate) fn active(&self) -> Option<ConnectionId> {
        *self.active.borrow()
    }

    pub(crate) async fn active_sender(&self) -> Option<PeerSender> {
        let conns = self.connections.read().await;
        self.active().and_then(|id| conns.get(&id).cloned())
    }

    pub(crate) async fn get(&self, id: ConnectionId) -> Option<PeerSender> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Write handles for every open connection, oldest first.
    pub(crate) async fn all(&self) -> Vec<PeerSender> {
        let conns = self.connections.read().await;
        let mut senders: Vec<PeerSender> = conns.values().cloned().collect();
        senders.sort_by_key(PeerSender::id);
        senders
    }

    pub(crate) async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Wait until some connection is active and return its ID.
    pub(crate) async fn wait_for_active(&self) -> Result<ConnectionId> {
        let mut rx = self.active.subscribe();
        loop {
            if let Some(id) = *rx.borrow_and_update() {
                return Ok(id);
            }
            rx.changed()
                .await
                .map_err(|_| MockSocketError::ConnectionClosed)?;
        }
    }
}
