//! Error types for todo-reminder store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during `SqliteStore` operations.
#[derive(Error, Debug)]
pub enum SqliteStoreError {
    /// The database file could not be opened or created.
    #[error("Failed to open database at {path}: {source}")]
    Open {
        /// Location of the database file.
        path: PathBuf,
        /// Underlying driver error.
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A timestamp could not be represented in the database.
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    /// Failed to acquire the connection lock.
    #[error("Database lock error")]
    LockError,

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
