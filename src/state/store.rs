//! Active state store implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::registry::OverlayDefinition;

use super::instance::ActiveOverlay;

/// What an `end` call matched
#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    /// Matched by id; no end notification is owed
    ById(ActiveOverlay),
    /// Matched by name fallback; the caller publishes `overlay:<name>:end`
    ByName(ActiveOverlay),
    /// Nothing matched; silent no-op
    NoMatch,
}

/// Ordered list of currently-visible overlay instances
pub struct ActiveState {
    overlays: Mutex<Vec<ActiveOverlay>>,
    next_id: AtomicU64,
}

impl ActiveState {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            overlays: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActiveOverlay>> {
        self.overlays.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Show an instance of a definition
    ///
    /// Never rejects: showing the same name twice yields two independent
    /// instances. Without a payload the instance carries the definition's
    /// own config.
    pub fn show(&self, definition: &OverlayDefinition, payload: Option<Value>) -> ActiveOverlay {
        let instance = ActiveOverlay {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: definition.name.clone(),
            kind: definition.kind,
            layout: definition.layout,
            payload: payload.unwrap_or_else(|| definition.config.clone()),
        };

        tracing::debug!(overlay = %instance.name, id = instance.id, "overlay shown");
        self.lock().push(instance.clone());
        instance
    }

    /// Remove every active instance with this name
    ///
    /// Returns the number removed. An empty name or a name with no active
    /// instances is a silent no-op; the caller broadcasts only when the
    /// count is non-zero.
    pub fn hide(&self, name: &str) -> usize {
        if name.is_empty() {
            return 0;
        }

        let mut overlays = self.lock();
        let before = overlays.len();
        overlays.retain(|o| o.name != name);
        let removed = before - overlays.len();

        if removed > 0 {
            tracing::debug!(overlay = %name, removed, "overlay hidden");
        }
        removed
    }

    /// End at most one active instance
    ///
    /// Single pass in insertion order, first match wins: per instance the id
    /// check runs before the name check, and only the first matching
    /// instance is removed per call even when several share a name. The
    /// outcome tells the caller whether an end notification is owed
    /// (name-fallback match) or not (id match).
    pub fn end(&self, id: Option<u64>, name: Option<&str>) -> EndOutcome {
        let name = name.filter(|n| !n.is_empty());

        let mut overlays = self.lock();
        let position = overlays.iter().position(|o| {
            id.is_some_and(|id| o.id == id) || name.is_some_and(|n| o.name == n)
        });

        match position {
            Some(index) => {
                let instance = overlays.remove(index);
                if id.is_some_and(|id| instance.id == id) {
                    tracing::debug!(overlay = %instance.name, id = instance.id, "overlay ended by id");
                    EndOutcome::ById(instance)
                } else {
                    tracing::debug!(overlay = %instance.name, id = instance.id, "overlay ended by name");
                    EndOutcome::ByName(instance)
                }
            }
            None => EndOutcome::NoMatch,
        }
    }

    /// Read-only snapshot of the active list, insertion order
    pub fn active(&self) -> Vec<ActiveOverlay> {
        self.lock().clone()
    }

    /// Number of active instances
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is active
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Empty the active list, returning how many instances were dropped
    pub fn clear(&self) -> usize {
        let mut overlays = self.lock();
        let dropped = overlays.len();
        overlays.clear();
        dropped
    }
}

impl Default for ActiveState {
    fn default() -> Self {
        Self::new()
    }
}
