//! Recovery journal: append-only lifecycle event log
//!
//! One JSON record per line, one line per significant CrawlURI lifecycle
//! event. The journal doubles as the operational audit trail and as the
//! recovery source after a crash: every `added`/`rescheduled` record without
//! a matching terminal record is still pending work.

mod record;
mod replay;
mod writer;

pub use record::JournalRecord;
pub use replay::{audit, replay, JournalStats, PendingUri};
pub use writer::Journal;

use thiserror::Error;

/// Errors from journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to open journal at {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Journal write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("Journal record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for journal operations
pub type JournalResult<T> = std::result::Result<T, JournalError>;
