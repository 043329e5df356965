//! Per-user registry of live relay connections.
//!
//! The registry is owned by the WebSocket adapter state and injected into
//! each connection; its mutation API is the only access path. Entries are
//! added when a connection reaches its ready state and removed when the
//! connection closes, via an RAII guard so every exit path cleans up.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::domain::UserId;

/// Concurrency-safe mapping from user identity to live connection handles.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<HashMap<UserId, HashSet<Uuid>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live connection for `user_id`. Dropping the returned guard
    /// removes the entry again.
    pub fn register(self: &Arc<Self>, user_id: UserId) -> ConnectionGuard {
        let connection_id = Uuid::new_v4();
        self.lock().entry(user_id).or_default().insert(connection_id);
        ConnectionGuard {
            registry: Arc::clone(self),
            user_id,
            connection_id,
        }
    }

    /// Number of live connections currently registered for `user_id`.
    pub fn connection_count(&self, user_id: UserId) -> usize {
        self.lock().get(&user_id).map_or(0, HashSet::len)
    }

    fn remove(&self, user_id: UserId, connection_id: Uuid) {
        let mut inner = self.lock();
        if let Some(connections) = inner.get_mut(&user_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                inner.remove(&user_id);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, HashSet<Uuid>>> {
        // The critical sections never panic, but a poisoned lock must not
        // take every future connection down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its connection from the registry on drop.
pub struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    user_id: UserId,
    connection_id: Uuid,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.user_id, self.connection_id);
    }
}
