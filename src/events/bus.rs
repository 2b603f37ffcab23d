//! Event bus implementation
//!
//! Dispatch is synchronous and in subscription order. A failing handler is
//! logged and does not stop the remaining handlers for that topic, so one
//! misbehaving subscriber cannot break overlay triggering for everyone else.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::topic::Topic;

/// Boxed handler invoked on publish
pub type Handler = dyn Fn(Option<&Value>) -> crate::Result<()> + Send + Sync;

/// Opaque token identifying one subscription
///
/// Unsubscribing is scoped to exactly this handle; other subscriptions on
/// the same topic are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscription {
    id: u64,
    handler: std::sync::Arc<Handler>,
}

/// Publish/subscribe bus keyed by [`Topic`]
pub struct EventBus {
    topics: Mutex<HashMap<Topic, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Topic, Vec<Subscription>>> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe a handler to a topic
    ///
    /// Handlers on the same topic are invoked in subscription order.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionHandle
    where
        F: Fn(Option<&Value>) -> crate::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().entry(topic).or_default().push(Subscription {
            id,
            handler: std::sync::Arc::new(handler),
        });
        SubscriptionHandle(id)
    }

    /// Publish a payload to every handler subscribed to a topic
    ///
    /// Returns the number of handlers invoked. Handler failures are logged
    /// and do not stop dispatch. Handlers are snapshotted before invocation,
    /// so a handler may subscribe or unsubscribe without deadlocking; such
    /// changes take effect from the next publish.
    pub fn publish(&self, topic: &Topic, payload: Option<&Value>) -> usize {
        let handlers: Vec<_> = self
            .lock()
            .get(topic)
            .map(|subs| {
                subs.iter()
                    .map(|s| std::sync::Arc::clone(&s.handler))
                    .collect()
            })
            .unwrap_or_default();

        for handler in &handlers {
            if let Err(error) = handler.as_ref()(payload) {
                tracing::error!(topic = %topic, error = %error, "event handler failed");
            }
        }

        handlers.len()
    }

    /// Remove a subscription
    ///
    /// Idempotent: unsubscribing a handle that was already removed (or never
    /// existed) is a no-op.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut topics = self.lock();
        for subs in topics.values_mut() {
            subs.retain(|s| s.id != handle.0);
        }
        topics.retain(|_, subs| !subs.is_empty());
    }

    /// Number of handlers currently subscribed to a topic
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.lock().get(topic).map_or(0, Vec::len)
    }

    /// Total number of live subscriptions across all topics
    pub fn subscription_count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Whether a handle still refers to a live subscription
    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.lock()
            .values()
            .any(|subs| subs.iter().any(|s| s.id == handle.0))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
