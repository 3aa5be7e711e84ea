//! Error types for the storage layer

use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O errors from the file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A key that cannot be used as a document name
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The stored document changed since it was loaded
    #[error("Team {team_id} was modified concurrently: expected revision {expected}, found {found}")]
    Conflict { team_id: String, expected: u64, found: u64 },

    /// Write batch over the per-commit operation limit
    #[error("Write batch too large: {ops} operations, limit is {max}")]
    BatchTooLarge { ops: usize, max: usize },
}

impl StoreError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }
}
