//! Layout-partitioned snapshots
//!
//! Displays never replay individual triggers. After every state mutation
//! the full snapshot is pushed to all connections, and a late-joining
//! connection receives it once on connect, so every display converges to
//! current truth from any starting point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionId, DisplayChannel};
use crate::events::Topic;
use crate::registry::Layout;
use crate::state::{ActiveOverlay, ActiveState};

/// The layout-partitioned view of all active instances
///
/// The four partitions are a disjoint cover of the active list; relative
/// order within each partition is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instances with [`Layout::Fullscreen`]
    pub fullscreen: Vec<ActiveOverlay>,
    /// Instances with [`Layout::Center`]
    pub center: Vec<ActiveOverlay>,
    /// Instances with [`Layout::Right`]
    pub right: Vec<ActiveOverlay>,
    /// Instances with [`Layout::Left`]
    pub left: Vec<ActiveOverlay>,
}

impl Snapshot {
    /// Partition an active list by layout, preserving relative order
    pub fn of(overlays: &[ActiveOverlay]) -> Self {
        let mut snapshot = Snapshot::default();
        for overlay in overlays {
            let partition = match overlay.layout {
                Layout::Fullscreen => &mut snapshot.fullscreen,
                Layout::Center => &mut snapshot.center,
                Layout::Right => &mut snapshot.right,
                Layout::Left => &mut snapshot.left,
            };
            partition.push(overlay.clone());
        }
        snapshot
    }

    /// Total instance count across all partitions
    pub fn len(&self) -> usize {
        self.fullscreen.len() + self.center.len() + self.right.len() + self.left.len()
    }

    /// Whether every partition is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Projects the active state into a [`Snapshot`] and fans it out
pub struct SnapshotBroadcaster {
    state: Arc<ActiveState>,
    channel: Arc<dyn DisplayChannel>,
}

impl SnapshotBroadcaster {
    /// Create a broadcaster over a state store and a push channel
    pub fn new(state: Arc<ActiveState>, channel: Arc<dyn DisplayChannel>) -> Self {
        Self { state, channel }
    }

    /// Current snapshot of the active state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.state.active())
    }

    /// Push the current snapshot to every connection
    pub fn broadcast(&self) {
        match serde_json::to_value(self.snapshot()) {
            Ok(payload) => {
                self.channel
                    .broadcast_all(&Topic::State.to_string(), payload);
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize snapshot");
            }
        }
    }

    /// Push the current snapshot to one connection only
    ///
    /// Used on connect so a late joiner converges without event replay.
    pub fn send_to(&self, connection: ConnectionId) {
        match serde_json::to_value(self.snapshot()) {
            Ok(payload) => {
                self.channel
                    .send_to(connection, &Topic::State.to_string(), payload);
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize snapshot");
            }
        }
    }
}
