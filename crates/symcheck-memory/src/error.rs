//! Error types for history storage.

use thiserror::Error;

/// Errors returned by [`crate::HistoryStore`].
#[derive(Error, Debug)]
pub enum MemoryError {
    /// No record with this id.
    #[error("History entry {0} not found")]
    NotFound(i64),
    /// SQLite failure.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Filesystem failure while preparing the database location.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored row could not be decoded.
    #[error("Corrupt history row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}
