//! Live realtime connections, keyed by user id.
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::DashMap;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::traits::{NotificationError, RealtimeChannel};

/// Identifies one connection, so that closing a stale connection cannot remove its replacement.
pub type ConnectionId = u64;

pub trait ConnectionRegistry: Send + Sync {
    type Handle: Clone + Send + Sync;

    /// Registers the connection for `user_id`, replacing any previous connection for that user.
    fn register(&self, user_id: &str, handle: Self::Handle) -> ConnectionId;

    fn lookup(&self, user_id: &str) -> Option<Self::Handle>;

    /// Removes the user's connection if it is still the one identified by `connection`. Returns true if it was
    /// removed.
    fn unregister(&self, user_id: &str, connection: ConnectionId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub event: String,
    pub payload: Value,
}

pub type RealtimeSender = mpsc::Sender<RealtimeMessage>;

pub struct InMemoryConnectionRegistry<H> {
    connections: DashMap<String, (ConnectionId, H)>,
    next_id: AtomicU64,
}

impl<H> Default for InMemoryConnectionRegistry<H> {
    fn default() -> Self {
        Self { connections: DashMap::new(), next_id: AtomicU64::new(1) }
    }
}

impl<H> InMemoryConnectionRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl<H: Clone + Send + Sync> ConnectionRegistry for InMemoryConnectionRegistry<H> {
    type Handle = H;

    fn register(&self, user_id: &str, handle: H) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if self.connections.insert(user_id.to_string(), (id, handle)).is_some() {
            debug!("📡️ Connection for {user_id} replaced by connection #{id}");
        } else {
            debug!("📡️ {user_id} connected (#{id})");
        }
        id
    }

    fn lookup(&self, user_id: &str) -> Option<H> {
        self.connections.get(user_id).map(|entry| entry.value().1.clone())
    }

    fn unregister(&self, user_id: &str, connection: ConnectionId) -> bool {
        let removed = self.connections.remove_if(user_id, |_, (id, _)| *id == connection).is_some();
        if removed {
            debug!("📡️ {user_id} disconnected (#{connection})");
        }
        removed
    }
}

/// Unregisters its connection when dropped, e.g. when the client goes away and the response stream is dropped.
pub struct ConnectionGuard<R: ConnectionRegistry> {
    registry: Arc<R>,
    user_id: String,
    connection: ConnectionId,
}

impl<R: ConnectionRegistry> ConnectionGuard<R> {
    pub fn register(registry: Arc<R>, user_id: &str, handle: R::Handle) -> Self {
        let connection = registry.register(user_id, handle);
        Self { registry, user_id: user_id.to_string(), connection }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }
}

impl<R: ConnectionRegistry> Drop for ConnectionGuard<R> {
    fn drop(&mut self) {
        self.registry.unregister(&self.user_id, self.connection);
    }
}

/// A [`RealtimeChannel`] that writes events to the recipient's live connection, if they have one.
pub struct RegistryChannel<R> {
    registry: Arc<R>,
}

impl<R> RegistryChannel<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }
}

impl<R> RealtimeChannel for RegistryChannel<R>
where R: ConnectionRegistry<Handle = RealtimeSender>
{
    async fn emit(&self, recipient_id: &str, event_name: &str, payload: &Value) -> Result<(), NotificationError> {
        let sender = self
            .registry
            .lookup(recipient_id)
            .ok_or_else(|| NotificationError::RecipientOffline(recipient_id.to_string()))?;
        let message = RealtimeMessage { event: event_name.to_string(), payload: payload.clone() };
        // A client that cannot keep up loses events rather than stalling the fan-out
        sender.try_send(message).map_err(|e| NotificationError::RealtimeFailed(format!("{recipient_id}: {e}")))
    }
}
