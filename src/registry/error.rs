//! Registry error types

/// Error type for definition registration
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Definition carries a `type` outside {text, video, html, audio}
    UnsupportedKind(String),
    /// Definition JSON did not match the expected shape
    InvalidDefinition(String),
    /// Name already registered (only with duplicate rejection enabled)
    DuplicateName(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::UnsupportedKind(kind) => {
                write!(f, "unsupported overlay type: {}", kind)
            }
            RegistryError::InvalidDefinition(msg) => {
                write!(f, "invalid overlay definition: {}", msg)
            }
            RegistryError::DuplicateName(name) => {
                write!(f, "overlay name already registered: {}", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
