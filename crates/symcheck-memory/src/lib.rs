//! Persistent analysis history for symcheck.
//!
//! One SQLite file, one table. Every operation opens its own connection,
//! which is closed when the operation returns on any path.

pub mod error;
pub mod history;

pub use error::MemoryError;
pub use history::HistoryStore;
