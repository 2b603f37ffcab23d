//! Overlay state and event broker for realtime broadcast graphics
//!
//! External producers (chat bots, automation) register overlay definitions
//! and trigger them by name; passive display surfaces (browser overlay
//! views) receive layout-partitioned state snapshots over a realtime push
//! channel and render whatever the snapshot says.
//!
//! # Architecture
//!
//! ```text
//!   triggers (direct calls or string topics via dispatch)
//!            │
//!            ▼
//!        EventBus ──► per-definition show/hide handlers
//!            ▲                   │
//!   overlay:<name>:end           ▼
//!      notifications        ActiveState
//!                                │
//!                 SnapshotBroadcaster (partition by layout)
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!        [display]           [display]           [display]
//! ```
//!
//! State flows one way: a trigger mutates [`ActiveState`], and every
//! mutation is followed by a full snapshot broadcast, so displays converge
//! without replaying events. A connection that joins late receives the
//! current snapshot immediately; a connection that leaves has exactly its
//! own bus subscriptions torn down.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use overlay_rs::{LocalChannel, OverlayBroker};
//! use serde_json::json;
//!
//! let channel = Arc::new(LocalChannel::new());
//! let broker = OverlayBroker::new(channel.clone());
//!
//! let (conn, _inbox) = channel.open();
//! broker.on_connect(conn);
//!
//! broker.dispatch(
//!     "overlays:add",
//!     Some(json!([{"name": "sub", "type": "text", "layout": "left"}])),
//! );
//! broker.dispatch("overlay:sub:show", Some(json!({"text": "X subscribed!"})));
//!
//! assert_eq!(broker.state().len(), 1);
//! ```

pub mod broker;
pub mod connection;
pub mod error;
pub mod events;
pub mod registry;
pub mod snapshot;
pub mod state;

pub use broker::{BrokerConfig, BrokerStats, OverlayBroker};
pub use connection::{
    AssetServer, ConnectionId, ConnectionManager, DisplayChannel, LocalChannel, OutboundMessage,
};
pub use error::{Error, Result};
pub use events::{EventBus, SubscriptionHandle, Topic, TriggerKind, END_OVERLAY_MESSAGE};
pub use registry::{Layout, OverlayDefinition, OverlayKind, OverlayRegistry, RegistryError};
pub use snapshot::{Snapshot, SnapshotBroadcaster};
pub use state::{ActiveOverlay, ActiveState, EndOutcome};
