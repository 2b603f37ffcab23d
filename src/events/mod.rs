//! Named-event publish/subscribe facility
//!
//! Triggers reach overlays through the [`EventBus`]: registering an overlay
//! installs show/hide handlers, and external callers publish to the same
//! topics either directly or through the string-topic boundary. Topics are
//! typed ([`Topic`]); the string forms (`overlay:<name>:show`, ...) exist
//! only where the wire protocol requires them.

pub mod bus;
pub mod topic;

pub use bus::{EventBus, SubscriptionHandle};
pub use topic::{Topic, TriggerKind, END_OVERLAY_MESSAGE};
