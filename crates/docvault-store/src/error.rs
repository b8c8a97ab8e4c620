//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Duplicate key on insert.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Internal lock poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
