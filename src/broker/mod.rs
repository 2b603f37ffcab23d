//! Overlay broker
//!
//! One [`OverlayBroker`] owns the definition registry, the event bus, the
//! active state, and the connection table. There is no process-global
//! state: several independent brokers can coexist in one process.
//!
//! Direct trigger methods ([`show`](OverlayBroker::show),
//! [`hide`](OverlayBroker::hide)) publish to the same bus topics the
//! string-topic boundary ([`dispatch`](OverlayBroker::dispatch)) resolves
//! to, so the two call styles cannot diverge.

pub mod config;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::connection::{
    AssetServer, ConnectionId, ConnectionManager, DisplayChannel,
};
use crate::events::{EventBus, SubscriptionHandle, Topic, END_OVERLAY_MESSAGE};
use crate::registry::{OverlayDefinition, OverlayRegistry, RegistryError};
use crate::snapshot::{Snapshot, SnapshotBroadcaster};
use crate::state::{ActiveState, EndOutcome};

pub use config::BrokerConfig;

/// Point-in-time counters for one broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerStats {
    /// Tracked display connections
    pub connections: usize,
    /// Currently-visible overlay instances
    pub active_overlays: usize,
    /// Registered definitions
    pub registered_definitions: usize,
    /// Live bus subscriptions (registry handlers plus external subscribers)
    pub bus_subscriptions: usize,
}

/// The overlay state and event broker
pub struct OverlayBroker {
    config: BrokerConfig,
    bus: Arc<EventBus>,
    registry: Arc<OverlayRegistry>,
    state: Arc<ActiveState>,
    broadcaster: Arc<SnapshotBroadcaster>,
    connections: ConnectionManager,
    assets: Option<Arc<dyn AssetServer>>,
}

impl OverlayBroker {
    /// Create a broker with default configuration
    pub fn new(channel: Arc<dyn DisplayChannel>) -> Self {
        Self::with_config(BrokerConfig::default(), channel)
    }

    /// Create a broker with custom configuration
    pub fn with_config(config: BrokerConfig, channel: Arc<dyn DisplayChannel>) -> Self {
        let state = Arc::new(ActiveState::new());
        let broadcaster = Arc::new(SnapshotBroadcaster::new(Arc::clone(&state), channel));

        Self {
            config,
            bus: Arc::new(EventBus::new()),
            registry: Arc::new(OverlayRegistry::new()),
            state,
            broadcaster,
            connections: ConnectionManager::new(),
            assets: None,
        }
    }

    /// Attach the static-asset collaborator
    pub fn with_assets(mut self, assets: Arc<dyn AssetServer>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// The event bus, for external subscribers (e.g. an `overlay:<name>:end`
    /// listener reacting to completions)
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The definition registry
    pub fn registry(&self) -> &Arc<OverlayRegistry> {
        &self.registry
    }

    /// The active state store
    pub fn state(&self) -> &Arc<ActiveState> {
        &self.state
    }

    /// Register definitions globally
    ///
    /// Each definition is processed independently in input order; a rejected
    /// entry is logged and skipped, later entries still register.
    pub fn add_overlays(&self, definitions: impl IntoIterator<Item = OverlayDefinition>) {
        for definition in definitions {
            if let Err(error) = self.install(definition, None) {
                tracing::warn!(error = %error, "overlay definition rejected");
            }
        }
    }

    /// Register definitions owned by a connection
    ///
    /// The show/hide subscriptions installed here are torn down when that
    /// connection disconnects.
    pub fn add_overlays_scoped(
        &self,
        connection: ConnectionId,
        definitions: impl IntoIterator<Item = OverlayDefinition>,
    ) {
        for definition in definitions {
            if let Err(error) = self.install(definition, Some(connection)) {
                tracing::warn!(error = %error, "overlay definition rejected");
            }
        }
    }

    /// Register definitions from boundary JSON (one object or an array)
    ///
    /// Entries are parsed and installed independently: one bad entry does
    /// not prevent later entries from registering.
    pub fn add_overlays_from_value(&self, value: &Value) {
        let entries: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };

        for entry in entries {
            match OverlayDefinition::from_value(entry) {
                Ok(definition) => {
                    if let Err(error) = self.install(definition, None) {
                        tracing::warn!(error = %error, "overlay definition rejected");
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "overlay definition rejected");
                }
            }
        }
    }

    fn install(
        &self,
        definition: OverlayDefinition,
        owner: Option<ConnectionId>,
    ) -> Result<(), RegistryError> {
        if self.config.reject_duplicate_names && self.registry.contains(&definition.name) {
            return Err(RegistryError::DuplicateName(definition.name));
        }

        let definition = Arc::new(definition);

        let show = {
            let definition = Arc::clone(&definition);
            let state = Arc::clone(&self.state);
            let broadcaster = Arc::clone(&self.broadcaster);
            self.bus
                .subscribe(Topic::show(&definition.name), move |payload| {
                    state.show(&definition, payload.cloned());
                    broadcaster.broadcast();
                    Ok(())
                })
        };

        let hide = {
            let definition = Arc::clone(&definition);
            let state = Arc::clone(&self.state);
            let broadcaster = Arc::clone(&self.broadcaster);
            self.bus
                .subscribe(Topic::hide(&definition.name), move |_| {
                    if state.hide(&definition.name) > 0 {
                        broadcaster.broadcast();
                    }
                    Ok(())
                })
        };

        if let Some(connection) = owner {
            if !self.connections.track(connection, show)
                || !self.connections.track(connection, hide)
            {
                tracing::warn!(
                    connection,
                    overlay = %definition.name,
                    "owner connection not tracked, subscriptions stay global"
                );
            }
        }

        if let Some(dir) = &definition.static_dir {
            match &self.assets {
                Some(assets) => assets.expose(&format!("/{}", definition.name), dir),
                None => tracing::warn!(
                    overlay = %definition.name,
                    "static directory configured but no asset server attached"
                ),
            }
        }

        tracing::info!(
            overlay = %definition.name,
            kind = %definition.kind,
            layout = ?definition.layout,
            "overlay registered"
        );
        self.registry.insert(definition, vec![show, hide]);
        Ok(())
    }

    /// Trigger a show
    ///
    /// Publishes on the bus: an unregistered name has no subscribers and is
    /// a silent no-op; a duplicated name fires every entry registered under
    /// it.
    pub fn show(&self, name: &str, payload: Option<Value>) {
        self.bus.publish(&Topic::show(name), payload.as_ref());
    }

    /// Trigger a hide of every active instance with this name
    pub fn hide(&self, name: &str) {
        self.bus.publish(&Topic::hide(name), None);
    }

    /// End at most one active instance
    ///
    /// Matching follows the active-state single-pass rule. A name-fallback
    /// match additionally publishes `overlay:<name>:end` with the payload so
    /// external subscribers can react to the completion; an id match does
    /// not.
    pub fn end(&self, id: Option<u64>, name: Option<&str>, payload: Option<Value>) {
        match self.state.end(id, name) {
            EndOutcome::ById(_) => {
                self.broadcaster.broadcast();
            }
            EndOutcome::ByName(instance) => {
                self.bus
                    .publish(&Topic::end(&instance.name), payload.as_ref());
                self.broadcaster.broadcast();
            }
            EndOutcome::NoMatch => {
                tracing::debug!(?id, ?name, "end matched no active overlay");
            }
        }
    }

    /// Empty the active state and broadcast the now-empty snapshot
    pub fn clear_state(&self) {
        self.state.clear();
        self.broadcaster.broadcast();
    }

    /// Empty the definition registry and remove the subscriptions it
    /// installed; active state is untouched
    pub fn clear_registry(&self) {
        let handles = self.registry.clear();
        let removed = handles.len();
        for handle in handles {
            self.bus.unsubscribe(handle);
        }
        tracing::info!(subscriptions = removed, "overlay registry cleared");
    }

    /// Route an external string-topic event
    ///
    /// This is the boundary where wire topics are parsed; everything behind
    /// it is typed. Unroutable topics are logged and dropped, never an
    /// error back to the caller.
    pub fn dispatch(&self, topic: &str, payload: Option<Value>) {
        match Topic::parse(topic) {
            Some(Topic::AddOverlays) => match payload {
                Some(value) => self.add_overlays_from_value(&value),
                None => tracing::warn!("overlays:add without a payload"),
            },
            Some(topic @ Topic::Overlay { .. }) => {
                self.bus.publish(&topic, payload.as_ref());
            }
            Some(Topic::State) => {
                tracing::warn!("overlays:state is outbound-only");
            }
            None => {
                tracing::debug!(topic, "unroutable topic");
            }
        }
    }

    /// A display surface connected
    ///
    /// The current snapshot is pushed to that connection only, so a late
    /// joiner converges without replaying past events.
    pub fn on_connect(&self, connection: ConnectionId) {
        if !self.connections.connect(connection) {
            tracing::warn!(connection, "connection id already tracked");
            return;
        }
        tracing::info!(connection, total = self.connections.len(), "display connected");
        self.broadcaster.send_to(connection);
    }

    /// A display surface disconnected
    ///
    /// Unsubscribes exactly the bus subscriptions this connection owns
    /// (idempotent per handle). When it was the last connection and the
    /// config says so, the definition registry is cleared as well.
    pub fn on_disconnect(&self, connection: ConnectionId) {
        let Some(cleanup) = self.connections.disconnect(connection) else {
            tracing::debug!(connection, "disconnect for untracked connection");
            return;
        };

        for handle in &cleanup.subscriptions {
            self.bus.unsubscribe(*handle);
        }
        tracing::info!(
            connection,
            owned_subscriptions = cleanup.subscriptions.len(),
            remaining = self.connections.len(),
            "display disconnected"
        );

        if cleanup.was_last && self.config.clear_registry_on_last_disconnect {
            self.clear_registry();
        }
    }

    /// Handle a message received from a connection
    ///
    /// Currently the only per-connection request is `endOverlay`; anything
    /// else is logged and dropped.
    pub fn handle_message(&self, connection: ConnectionId, topic: &str, payload: Option<Value>) {
        if topic != END_OVERLAY_MESSAGE {
            tracing::debug!(connection, topic, "unhandled connection message");
            return;
        }

        let request = payload
            .map(serde_json::from_value::<EndRequest>)
            .transpose()
            .unwrap_or_else(|error| {
                tracing::warn!(connection, error = %error, "malformed endOverlay request");
                None
            })
            .unwrap_or_default();

        self.end(request.id, request.name.as_deref(), request.payload);
    }

    /// Current layout-partitioned snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.broadcaster.snapshot()
    }

    /// Record that a connection owns an externally-created subscription
    ///
    /// For callers that subscribe their own handlers in a per-connection
    /// scope and want them torn down on disconnect.
    pub fn track_subscription(
        &self,
        connection: ConnectionId,
        handle: SubscriptionHandle,
    ) -> bool {
        self.connections.track(connection, handle)
    }

    /// Point-in-time counters
    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            connections: self.connections.len(),
            active_overlays: self.state.len(),
            registered_definitions: self.registry.len(),
            bus_subscriptions: self.bus.subscription_count(),
        }
    }
}

/// Wire shape of the `endOverlay` request
#[derive(Debug, Default, Deserialize)]
struct EndRequest {
    id: Option<u64>,
    name: Option<String>,
    payload: Option<Value>,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::connection::{LocalChannel, OutboundMessage};
    use crate::registry::{Layout, OverlayKind};

    fn broker() -> (OverlayBroker, Arc<LocalChannel>) {
        let channel = Arc::new(LocalChannel::new());
        let broker = OverlayBroker::new(channel.clone() as Arc<dyn DisplayChannel>);
        (broker, channel)
    }

    fn drain(rx: &mut UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[test]
    fn test_register_and_show_via_string_topics() {
        let (broker, _channel) = broker();

        broker.dispatch(
            "overlays:add",
            Some(json!([{"name": "sub", "type": "text", "layout": "left"}])),
        );
        broker.dispatch("overlay:sub:show", Some(json!({"text": "X subscribed!"})));

        let active = broker.state().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "sub");
        assert_eq!(active[0].layout, Layout::Left);
        assert_eq!(active[0].payload, json!({"text": "X subscribed!"}));

        let snapshot = broker.snapshot();
        assert_eq!(snapshot.left.len(), 1);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_direct_calls_and_string_topics_share_one_path() {
        let (broker, _channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        broker.show("alert", None);
        broker.dispatch("overlay:alert:show", None);
        assert_eq!(broker.state().len(), 2);

        broker.hide("alert");
        assert!(broker.state().is_empty());
    }

    #[test]
    fn test_bad_batch_entry_does_not_stop_the_rest() {
        let (broker, _channel) = broker();

        broker.add_overlays_from_value(&json!([
            {"name": "bad", "type": "hologram"},
            {"name": "good", "type": "audio"},
        ]));

        let registered = broker.registry().list();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].name, "good");
        // the rejected entry installed no handlers either
        assert_eq!(broker.bus().subscriber_count(&Topic::show("bad")), 0);
    }

    #[test]
    fn test_show_unregistered_name_is_a_noop() {
        let (broker, _channel) = broker();
        broker.show("ghost", None);
        assert!(broker.state().is_empty());
    }

    #[test]
    fn test_hide_removes_all_instances_of_a_name() {
        let (broker, _channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        broker.show("alert", None);
        broker.show("alert", None);
        broker.hide("alert");

        assert!(broker.state().is_empty());
    }

    #[test]
    fn test_end_by_id_does_not_publish_end_event() {
        let (broker, _channel) = broker();
        broker.add_overlays([OverlayDefinition::new("raid", OverlayKind::Video)]);
        broker.show("raid", None);
        let id = broker.state().active()[0].id;

        let ended = Arc::new(Mutex::new(Vec::new()));
        {
            let ended = Arc::clone(&ended);
            broker.bus().subscribe(Topic::end("raid"), move |payload| {
                ended.lock().unwrap().push(payload.cloned());
                Ok(())
            });
        }

        broker.end(Some(id), Some("raid"), None);

        assert!(broker.state().is_empty());
        assert!(ended.lock().unwrap().is_empty());
    }

    #[test]
    fn test_end_by_name_fallback_publishes_end_event() {
        let (broker, _channel) = broker();
        broker.add_overlays([OverlayDefinition::new("raid", OverlayKind::Video)]);
        broker.show("raid", None);

        let ended = Arc::new(Mutex::new(Vec::new()));
        {
            let ended = Arc::clone(&ended);
            broker.bus().subscribe(Topic::end("raid"), move |payload| {
                ended.lock().unwrap().push(payload.cloned());
                Ok(())
            });
        }

        broker.end(Some(999_999), Some("raid"), Some(json!({"count": 5})));

        assert!(broker.state().is_empty());
        assert_eq!(*ended.lock().unwrap(), vec![Some(json!({"count": 5}))]);
    }

    #[test]
    fn test_end_overlay_message_from_connection() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("raid", OverlayKind::Video)]);
        broker.show("raid", None);
        let id = broker.state().active()[0].id;

        let (conn, _rx) = channel.open();
        broker.on_connect(conn);
        broker.handle_message(
            conn,
            END_OVERLAY_MESSAGE,
            Some(json!({"id": id, "name": "raid"})),
        );

        assert!(broker.state().is_empty());
    }

    #[test]
    fn test_snapshot_sent_to_new_connection_only() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);
        broker.show("alert", None);

        let (first, mut rx_first) = channel.open();
        broker.on_connect(first);
        drain(&mut rx_first);

        let (second, mut rx_second) = channel.open();
        broker.on_connect(second);

        let messages = drain(&mut rx_second);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "overlays:state");
        let snapshot: Snapshot = serde_json::from_value(messages[0].payload.clone()).unwrap();
        assert_eq!(snapshot.center.len(), 1);

        // the first connection did not receive a second copy
        assert!(drain(&mut rx_first).is_empty());
    }

    #[test]
    fn test_every_mutation_broadcasts() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        let (conn, mut rx) = channel.open();
        broker.on_connect(conn);
        drain(&mut rx);

        broker.show("alert", None);
        broker.show("alert", None);
        broker.hide("alert");
        broker.show("alert", None);
        let id = broker.state().active()[0].id;
        broker.end(Some(id), None, None);
        broker.clear_state();

        let topics: Vec<_> = drain(&mut rx).into_iter().map(|m| m.topic).collect();
        assert_eq!(topics.len(), 6);
        assert!(topics.iter().all(|t| t == "overlays:state"));
    }

    #[test]
    fn test_hide_without_match_does_not_broadcast() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        let (conn, mut rx) = channel.open();
        broker.on_connect(conn);
        drain(&mut rx);

        broker.hide("alert");
        broker.end(Some(42), Some("nothing"), None);

        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_last_disconnect_clears_registry() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        let (first, _rx_a) = channel.open();
        let (second, _rx_b) = channel.open();
        broker.on_connect(first);
        broker.on_connect(second);

        broker.on_disconnect(first);
        assert_eq!(broker.registry().len(), 1);

        broker.on_disconnect(second);
        assert!(broker.registry().is_empty());
        // the registry's show/hide handlers went with it
        assert_eq!(broker.bus().subscription_count(), 0);
        broker.show("alert", None);
        assert!(broker.state().is_empty());
    }

    #[test]
    fn test_last_disconnect_keeps_registry_when_configured() {
        let channel = Arc::new(LocalChannel::new());
        let broker = OverlayBroker::with_config(
            BrokerConfig::default().clear_registry_on_last_disconnect(false),
            channel.clone() as Arc<dyn DisplayChannel>,
        );
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);

        let (conn, _rx) = channel.open();
        broker.on_connect(conn);
        broker.on_disconnect(conn);

        assert_eq!(broker.registry().len(), 1);
        broker.show("alert", None);
        assert_eq!(broker.state().len(), 1);
    }

    #[test]
    fn test_disconnect_removes_exactly_the_owned_subscriptions() {
        let (broker, channel) = broker();
        // installed before the connection existed; must survive
        broker.add_overlays([OverlayDefinition::new("global", OverlayKind::Text)]);

        let (scoped_conn, _rx_a) = channel.open();
        let (other, _rx_b) = channel.open();
        broker.on_connect(scoped_conn);
        broker.on_connect(other);

        let scoped: Vec<_> = (0..5)
            .map(|i| OverlayDefinition::new(format!("scoped{}", i), OverlayKind::Text))
            .collect();
        broker.add_overlays_scoped(scoped_conn, scoped);

        // an externally-installed subscription can be owned the same way
        let external = broker.bus().subscribe(Topic::end("scoped0"), |_| Ok(()));
        assert!(broker.track_subscription(scoped_conn, external));
        assert_eq!(broker.bus().subscription_count(), 13); // 1 global + 5 scoped, 2 each, + 1

        broker.on_disconnect(scoped_conn);
        assert!(!broker.bus().is_subscribed(external));

        for i in 0..5 {
            let name = format!("scoped{}", i);
            assert_eq!(broker.bus().subscriber_count(&Topic::show(&name)), 0);
            assert_eq!(broker.bus().subscriber_count(&Topic::hide(&name)), 0);
        }
        // the pre-existing subscription still works
        broker.show("global", None);
        assert_eq!(broker.state().len(), 1);
    }

    #[test]
    fn test_duplicate_names_both_fire_on_one_trigger() {
        let (broker, _channel) = broker();
        broker.add_overlays([
            OverlayDefinition::new("alert", OverlayKind::Text),
            OverlayDefinition::new("alert", OverlayKind::Audio),
        ]);

        broker.show("alert", None);

        let active = broker.state().active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].kind, OverlayKind::Text);
        assert_eq!(active[1].kind, OverlayKind::Audio);
    }

    #[test]
    fn test_reject_duplicate_names_when_configured() {
        let channel = Arc::new(LocalChannel::new());
        let broker = OverlayBroker::with_config(
            BrokerConfig::default().reject_duplicate_names(true),
            channel as Arc<dyn DisplayChannel>,
        );

        broker.add_overlays([
            OverlayDefinition::new("alert", OverlayKind::Text),
            OverlayDefinition::new("alert", OverlayKind::Audio),
        ]);

        let registered = broker.registry().list();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].kind, OverlayKind::Text);
    }

    #[test]
    fn test_static_dir_is_exposed_under_name() {
        struct RecordingAssets(Mutex<Vec<(String, std::path::PathBuf)>>);
        impl AssetServer for RecordingAssets {
            fn expose(&self, url_prefix: &str, dir: &std::path::Path) {
                self.0
                    .lock()
                    .unwrap()
                    .push((url_prefix.to_string(), dir.to_path_buf()));
            }
        }

        let channel = Arc::new(LocalChannel::new());
        let assets = Arc::new(RecordingAssets(Mutex::new(Vec::new())));
        let broker = OverlayBroker::new(channel as Arc<dyn DisplayChannel>)
            .with_assets(assets.clone() as Arc<dyn AssetServer>);

        broker.add_overlays([
            OverlayDefinition::new("gallery", OverlayKind::Html).static_dir("assets/gallery"),
        ]);

        let exposed = assets.0.lock().unwrap();
        assert_eq!(exposed.len(), 1);
        assert_eq!(exposed[0].0, "/gallery");
        assert_eq!(exposed[0].1, std::path::PathBuf::from("assets/gallery"));
    }

    #[test]
    fn test_stats() {
        let (broker, channel) = broker();
        broker.add_overlays([OverlayDefinition::new("alert", OverlayKind::Text)]);
        broker.show("alert", None);
        let (conn, _rx) = channel.open();
        broker.on_connect(conn);

        assert_eq!(
            broker.stats(),
            BrokerStats {
                connections: 1,
                active_overlays: 1,
                registered_definitions: 1,
                bus_subscriptions: 2,
            }
        );
    }
}
