use thiserror::Error;

/// Top-level error type shared by the Hearth crates.
///
/// Subsystem crates define their own error types for their operations; this
/// one covers the cross-cutting concerns (configuration, files, encoding)
/// and lets the `?` operator work at the composition root.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HearthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for HearthError {
    fn from(err: toml::de::Error) -> Self {
        HearthError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HearthError {
    fn from(err: toml::ser::Error) -> Self {
        HearthError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HearthError {
    fn from(err: serde_json::Error) -> Self {
        HearthError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Hearth core operations.
pub type Result<T> = std::result::Result<T, HearthError>;
