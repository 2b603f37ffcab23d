//! Simple overlay broker example
//!
//! Run with: cargo run --example simple_broker
//!
//! Wires a broker to an in-process channel, registers a few overlays the
//! way a chat bot would (over the string-topic boundary), fires triggers,
//! and prints every snapshot the "display" receives. A real deployment
//! replaces `LocalChannel` with a `DisplayChannel` impl over its transport
//! (WebSocket etc.) and feeds `dispatch`/`handle_message` from it.

use std::sync::Arc;

use overlay_rs::{LocalChannel, OverlayBroker, Topic, END_OVERLAY_MESSAGE};
use serde_json::json;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let channel = Arc::new(LocalChannel::new());
    let broker = OverlayBroker::new(channel.clone());

    // React to name-fallback completions, like a chat bot announcing the
    // end of a raid.
    broker.bus().subscribe(Topic::end("raid"), |payload| {
        println!("bot: raid ended, payload = {:?}", payload);
        Ok(())
    });

    // A display surface connects and immediately receives the (empty)
    // current snapshot.
    let (display, mut inbox) = channel.open();
    broker.on_connect(display);

    // A producer registers overlays over the wire.
    broker.dispatch(
        "overlays:add",
        Some(json!([
            {"name": "sub", "type": "text", "layout": "left"},
            {"name": "raid", "type": "video", "config": {"file": "raid.webm"}},
        ])),
    );

    broker.dispatch("overlay:sub:show", Some(json!({"text": "X subscribed!"})));
    broker.dispatch("overlay:raid:show", None);

    // The display asks to end the raid by name (unknown id), which also
    // publishes overlay:raid:end for the bot above.
    broker.handle_message(
        display,
        END_OVERLAY_MESSAGE,
        Some(json!({"name": "raid", "payload": {"viewers": 42}})),
    );

    broker.dispatch("overlay:sub:hide", None);
    broker.on_disconnect(display);

    while let Ok(message) = inbox.try_recv() {
        println!(
            "display <- {}: {}",
            message.topic,
            serde_json::to_string_pretty(&message.payload).unwrap()
        );
    }
}
