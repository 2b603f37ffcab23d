//! Overlay definition registry
//!
//! The registry is the authoritative list of known overlay definitions.
//! Registering a definition wires its show/hide triggers into the event bus
//! and optionally exposes a static directory through the asset-server
//! collaborator; see [`OverlayBroker::add_overlays`](crate::OverlayBroker::add_overlays)
//! for the wiring.

pub mod definition;
pub mod error;
pub mod store;

pub use definition::{Layout, OverlayDefinition, OverlayKind};
pub use error::RegistryError;
pub use store::OverlayRegistry;
