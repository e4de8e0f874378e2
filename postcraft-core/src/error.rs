//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
///
/// Stale ids are not represented here: operations on an element or post that
/// no longer exists are silent no-ops.
#[derive(Debug, Error)]
pub enum EditorError {
    /// User input rejected before any work started.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Imported brand kit file does not have the expected shape.
    #[error("Invalid brand kit format: {0}")]
    InvalidFormat(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An external generation service failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Brand kit persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),
}
