//! Already-seen filter: the admission gate in front of scheduling
//!
//! The frontier calls [`SeenFilter::admit`] with a canonicalized URI key;
//! the first call for a key returns `true` and every later call returns
//! `false`. The filter is only ever touched from the manager task, so
//! implementations need no internal locking; they do need crash durability
//! if the whole crawl is to keep its at-most-once discovery guarantee across
//! restarts.

mod memory;
mod sqlite;

pub use memory::MemorySeenFilter;
pub use sqlite::SqliteSeenFilter;

use thiserror::Error;

/// Errors from seen-filter operations
#[derive(Debug, Error)]
pub enum SeenError {
    #[error("Seen-filter database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Seen-filter IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for seen-filter operations
pub type SeenResult<T> = std::result::Result<T, SeenError>;

/// Admission gate preventing duplicate scheduling of the same canonical URI
pub trait SeenFilter: Send {
    /// Returns true exactly once per key: the first time it is seen
    fn admit(&mut self, key: &str) -> SeenResult<bool>;

    /// Number of distinct keys admitted so far
    fn count(&self) -> SeenResult<u64>;

    /// Commits pending state; called at checkpoint and on terminate
    fn close(&mut self) -> SeenResult<()>;
}
