//! Definition registry implementation
//!
//! Pure bookkeeping: definitions in insertion order plus the bus
//! subscriptions each registration installed. The broker owns the wiring;
//! keeping the handles here is what lets `clear` tear the triggers down
//! instead of leaving stale handlers firing into removed definitions.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::SubscriptionHandle;

use super::definition::OverlayDefinition;

struct RegisteredOverlay {
    definition: Arc<OverlayDefinition>,
    subscriptions: Vec<SubscriptionHandle>,
}

/// Ordered registry of overlay definitions
///
/// Duplicate names are allowed (each entry stays independently triggerable);
/// rejection is a broker-level policy, see
/// [`BrokerConfig::reject_duplicate_names`](crate::BrokerConfig::reject_duplicate_names).
pub struct OverlayRegistry {
    entries: Mutex<Vec<RegisteredOverlay>>,
}

impl OverlayRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RegisteredOverlay>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a definition together with the bus subscriptions it installed
    pub(crate) fn insert(
        &self,
        definition: Arc<OverlayDefinition>,
        subscriptions: Vec<SubscriptionHandle>,
    ) {
        self.lock().push(RegisteredOverlay {
            definition,
            subscriptions,
        });
    }

    /// Whether any entry carries this name
    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|e| e.definition.name == name)
    }

    /// First registered definition with this name, if any
    pub fn find(&self, name: &str) -> Option<Arc<OverlayDefinition>> {
        self.lock()
            .iter()
            .find(|e| e.definition.name == name)
            .map(|e| Arc::clone(&e.definition))
    }

    /// Current registrations, in insertion order
    pub fn list(&self) -> Vec<Arc<OverlayDefinition>> {
        self.lock()
            .iter()
            .map(|e| Arc::clone(&e.definition))
            .collect()
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Empty the registry, returning every subscription it was tracking
    ///
    /// Active overlay state is not touched. The caller unsubscribes the
    /// returned handles.
    pub(crate) fn clear(&self) -> Vec<SubscriptionHandle> {
        self.lock()
            .drain(..)
            .flat_map(|e| e.subscriptions)
            .collect()
    }
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}
