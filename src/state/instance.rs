//! Active overlay instances

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{Layout, OverlayKind};

/// One currently-visible occurrence of a definition
///
/// `name`, `kind`, and `layout` are copied from the definition at show time;
/// re-registering a name later does not affect instances already on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveOverlay {
    /// Process-unique token, fresh per show
    pub id: u64,

    /// Definition name this instance was shown from
    pub name: String,

    /// Renderer family, copied from the definition
    #[serde(rename = "type")]
    pub kind: OverlayKind,

    /// Snapshot partition, copied from the definition
    pub layout: Layout,

    /// Show-time data; defaults to the definition's config when the trigger
    /// supplied none
    pub payload: Value,
}
