//! Crate-level error types
//!
//! Area-specific errors (e.g. [`RegistryError`]) are aggregated here so
//! event handlers and boundary code can share a single `Result` type.

use crate::registry::RegistryError;

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for broker operations
#[derive(Debug)]
pub enum Error {
    /// A definition was rejected by the registry
    Registry(RegistryError),
    /// A payload could not be serialized or deserialized
    Json(serde_json::Error),
    /// A subscribed event handler reported a failure
    Handler(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Registry(e) => write!(f, "registry error: {}", e),
            Error::Json(e) => write!(f, "payload error: {}", e),
            Error::Handler(msg) => write!(f, "handler error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Registry(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Handler(_) => None,
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
