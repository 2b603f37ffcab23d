//! Connection tracking and disconnect cleanup

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::events::SubscriptionHandle;

use super::channel::ConnectionId;

#[derive(Default)]
struct ConnectionEntry {
    subscriptions: Vec<SubscriptionHandle>,
}

/// What a disconnect left behind for the broker to tear down
#[derive(Debug)]
pub struct DisconnectCleanup {
    /// Bus subscriptions the connection owned, to unsubscribe exactly once
    pub subscriptions: Vec<SubscriptionHandle>,
    /// Whether this was the last tracked connection
    pub was_last: bool,
}

/// Tracks connected display surfaces and their owned subscriptions
///
/// A connection's entry lists exactly the bus subscriptions installed in
/// its scope. Globally registered overlays never appear here, so tearing a
/// connection down cannot break triggering for the others.
pub struct ConnectionManager {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionManager {
    /// Create a manager with no connections
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, ConnectionEntry>> {
        self.connections.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start tracking a connection
    ///
    /// Returns `false` (and changes nothing) if the id is already tracked.
    pub fn connect(&self, connection: ConnectionId) -> bool {
        let mut connections = self.lock();
        if connections.contains_key(&connection) {
            return false;
        }
        connections.insert(connection, ConnectionEntry::default());
        true
    }

    /// Record that a connection owns a bus subscription
    ///
    /// Returns `false` if the connection is not tracked; the caller keeps
    /// the subscription global in that case.
    pub fn track(&self, connection: ConnectionId, handle: SubscriptionHandle) -> bool {
        match self.lock().get_mut(&connection) {
            Some(entry) => {
                entry.subscriptions.push(handle);
                true
            }
            None => false,
        }
    }

    /// Stop tracking a connection
    ///
    /// Returns its owned subscriptions and whether it was the last
    /// connection; `None` if the id was not tracked (terminal state, a
    /// second disconnect is a no-op).
    pub fn disconnect(&self, connection: ConnectionId) -> Option<DisconnectCleanup> {
        let mut connections = self.lock();
        let entry = connections.remove(&connection)?;
        Some(DisconnectCleanup {
            subscriptions: entry.subscriptions,
            was_last: connections.is_empty(),
        })
    }

    /// Whether a connection is currently tracked
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.lock().contains_key(&connection)
    }

    /// Number of tracked connections
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no connections are tracked
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
