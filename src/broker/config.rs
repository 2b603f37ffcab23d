//! Broker configuration

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Clear the definition registry when the last connection disconnects
    ///
    /// A reconnecting display then has nothing to show until overlays are
    /// re-registered. Disable to keep registrations alive across display
    /// reconnects.
    pub clear_registry_on_last_disconnect: bool,

    /// Reject definitions whose name is already registered
    ///
    /// Off by default: duplicates stay independently triggerable and one
    /// show trigger fires every entry with that name.
    pub reject_duplicate_names: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            clear_registry_on_last_disconnect: true,
            reject_duplicate_names: false,
        }
    }
}

impl BrokerConfig {
    /// Set whether the registry is cleared on last disconnect
    pub fn clear_registry_on_last_disconnect(mut self, clear: bool) -> Self {
        self.clear_registry_on_last_disconnect = clear;
        self
    }

    /// Set whether duplicate names are rejected
    pub fn reject_duplicate_names(mut self, reject: bool) -> Self {
        self.reject_duplicate_names = reject;
        self
    }
}
