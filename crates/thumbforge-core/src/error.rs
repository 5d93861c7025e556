//! Error types for document model operations.

use thiserror::Error;

/// Errors raised by the object model and persisted-format handling.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Invalid object: {0}")]
    InvalidObject(String),
    #[error("Invalid patch for {id}: {reason}")]
    InvalidPatch { id: String, reason: String },
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u64),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
