//! Error types for the skill engine

use thiserror::Error;

/// Main error type for the skill engine
#[derive(Error, Debug)]
pub enum SkillError {
    /// Evidence rejected at the scoring boundary (unknown domain, negative weight, ...)
    #[error("Malformed evidence: {0}")]
    MalformedEvidence(String),

    /// Prerequisite edges form a cycle or name an unknown domain
    #[error("Invalid prerequisite graph: {0}")]
    InvalidGraphConfiguration(String),

    /// Any other configuration defect (thresholds, signal table, ...)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file parse errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write profile: {0}")]
    WriteFailed(String),

    #[error("Corrupted profile record: {0}")]
    Corrupted(String),
}

/// Result type alias for skill engine operations
pub type Result<T> = std::result::Result<T, SkillError>;
