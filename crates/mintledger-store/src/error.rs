//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A write would change a record's immutable fields, or stored data is
    /// inconsistent.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A record changed since it was read; the batch was not applied.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// A blocking database task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),
}

impl From<mintledger_core::CoreError> for StoreError {
    fn from(e: mintledger_core::CoreError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
