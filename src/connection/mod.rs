//! Display connections
//!
//! The transport is abstract: anything that can push `(topic, payload)`
//! pairs to identified connections implements [`DisplayChannel`]. The
//! [`ConnectionManager`] tracks which bus subscriptions each connection
//! owns so disconnect cleanup is precise: a missed unsubscribe is a
//! permanent leak, and an over-eager one breaks triggering for everyone
//! else.

pub mod channel;
pub mod manager;

pub use channel::{
    AssetServer, ConnectionId, DisplayChannel, LocalChannel, OutboundMessage,
};
pub use manager::{ConnectionManager, DisconnectCleanup};
