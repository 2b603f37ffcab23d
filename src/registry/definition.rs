//! Overlay definition types
//!
//! A definition describes one reusable kind of on-stream element. Its
//! `config` is an opaque payload for the renderer on the display side; the
//! broker only inspects `name`, `type`, `layout`, and `static_dir`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RegistryError;

/// Renderer family of an overlay
///
/// Closed set: the JSON boundary rejects anything else per entry, so a bad
/// definition never lands in the registry half-constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// Text element
    Text,
    /// Video clip
    Video,
    /// Arbitrary HTML view
    Html,
    /// Audio-only cue
    Audio,
}

impl OverlayKind {
    /// Parse the wire spelling of a kind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(OverlayKind::Text),
            "video" => Some(OverlayKind::Video),
            "html" => Some(OverlayKind::Html),
            "audio" => Some(OverlayKind::Audio),
            _ => None,
        }
    }

    /// Wire spelling of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Text => "text",
            OverlayKind::Video => "video",
            OverlayKind::Html => "html",
            OverlayKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen region an overlay is assigned to
///
/// Determines which partition of the broadcast snapshot its instances land
/// in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Covers the whole surface
    Fullscreen,
    /// Centered region (the default)
    #[default]
    Center,
    /// Right-hand region
    Right,
    /// Left-hand region
    Left,
}

/// A registered, reusable overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDefinition {
    /// Display identifier and trigger-topic root
    pub name: String,

    /// Renderer family
    #[serde(rename = "type")]
    pub kind: OverlayKind,

    /// Opaque renderer configuration, passed through untouched
    ///
    /// Also the default payload for instances shown without one.
    #[serde(default, alias = "typeConfig")]
    pub config: Value,

    /// Snapshot partition, defaults to [`Layout::Center`]
    #[serde(default)]
    pub layout: Layout,

    /// Directory to expose for static serving under `/<name>`
    #[serde(
        default,
        rename = "staticDir",
        alias = "staticDirectory",
        skip_serializing_if = "Option::is_none"
    )]
    pub static_dir: Option<PathBuf>,
}

impl OverlayDefinition {
    /// Create a definition with default layout and an empty config
    pub fn new(name: impl Into<String>, kind: OverlayKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: Value::Null,
            layout: Layout::default(),
            static_dir: None,
        }
    }

    /// Set the renderer configuration
    pub fn config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Set the layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the static directory
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Parse a definition from boundary JSON
    ///
    /// An unknown `type` is reported as [`RegistryError::UnsupportedKind`]
    /// rather than a generic shape error, so batch registration can log what
    /// was actually wrong with the rejected entry.
    pub fn from_value(value: &Value) -> Result<Self, RegistryError> {
        if let Some(kind) = value.get("type").and_then(Value::as_str) {
            if OverlayKind::parse(kind).is_none() {
                return Err(RegistryError::UnsupportedKind(kind.to_string()));
            }
        }
        serde_json::from_value(value.clone())
            .map_err(|e| RegistryError::InvalidDefinition(e.to_string()))
    }
}
