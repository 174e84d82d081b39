//! Error types for the portal E2E dashboard

use thiserror::Error;

use crate::types::DataKind;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid result artifact: {0}")]
    InvalidArtifact(String),

    #[error("Invalid run request: {0}")]
    Validation(#[from] ValidationError),
}

/// Reasons a run request is refused before anything is spawned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no tests selected")]
    EmptySelection,

    #[error("unknown suite: {0}")]
    UnknownSuite(String),

    #[error("unknown test '{test}' in suite '{suite}'")]
    UnknownTest { suite: String, test: String },

    #[error("suite '{suite}' requires at least one of {data}")]
    MissingSelectionData { suite: String, data: DataKind },
}
