//! Realtime push channel abstraction
//!
//! Pushes are fire-and-forget: no acknowledgment is awaited and a closed
//! peer is simply skipped, matching the best-effort delivery contract.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;

/// Transport-assigned identity of a connected display surface
pub type ConnectionId = u64;

/// Realtime push channel to connected display surfaces
pub trait DisplayChannel: Send + Sync {
    /// Push a payload to one connection
    fn send_to(&self, connection: ConnectionId, topic: &str, payload: Value);

    /// Push a payload to every connection
    fn broadcast_all(&self, topic: &str, payload: Value);
}

/// Static-asset collaborator
///
/// Registering a definition with a static directory asks this collaborator
/// to expose it under `/<name>`. The actual file serving is outside the
/// broker.
pub trait AssetServer: Send + Sync {
    /// Expose a local directory under a URL prefix
    fn expose(&self, url_prefix: &str, dir: &Path);
}

/// A `(topic, payload)` pair pushed to a connection
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Wire topic, e.g. `overlays:state`
    pub topic: String,
    /// JSON payload
    pub payload: Value,
}

/// In-process [`DisplayChannel`] backed by per-connection mpsc queues
///
/// Each `open` call allocates a connection id and an unbounded receiver for
/// that peer's messages. Used by tests and demos; a real deployment wraps
/// its transport (WebSocket etc.) in its own `DisplayChannel` impl.
pub struct LocalChannel {
    peers: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<OutboundMessage>>>,
    next_id: AtomicU64,
}

impl LocalChannel {
    /// Create a channel with no peers
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, mpsc::UnboundedSender<OutboundMessage>>> {
        self.peers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new peer, returning its id and the receiving end
    pub fn open(&self) -> (ConnectionId, mpsc::UnboundedReceiver<OutboundMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(id, tx);
        (id, rx)
    }

    /// Drop a peer; subsequent pushes to it are skipped
    pub fn close(&self, connection: ConnectionId) {
        self.lock().remove(&connection);
    }

    /// Number of open peers
    pub fn peer_count(&self) -> usize {
        self.lock().len()
    }
}

impl DisplayChannel for LocalChannel {
    fn send_to(&self, connection: ConnectionId, topic: &str, payload: Value) {
        if let Some(tx) = self.lock().get(&connection) {
            // Receiver may have been dropped; fire-and-forget
            let _ = tx.send(OutboundMessage {
                topic: topic.to_string(),
                payload,
            });
        }
    }

    fn broadcast_all(&self, topic: &str, payload: Value) {
        for tx in self.lock().values() {
            let _ = tx.send(OutboundMessage {
                topic: topic.to_string(),
                payload: payload.clone(),
            });
        }
    }
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new()
    }
}
