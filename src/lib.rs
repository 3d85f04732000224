//! Shiori: a crash-recoverable, polite URI frontier
//!
//! This crate implements the scheduling core of a large-scale web crawler:
//! per-host work queues with politeness delays, retry/backoff policies, a
//! recovery journal, and a single-task manager that fetch workers talk to
//! through a bounded producer/consumer contract.

pub mod checkpoint;
pub mod config;
pub mod frontier;
pub mod journal;
pub mod model;
pub mod seen;
pub mod url;

use thiserror::Error;

/// Main error type for Shiori operations
#[derive(Debug, Error)]
pub enum ShioriError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URI error: {0}")]
    Uri(#[from] UriError),

    #[error("URI parse error: {0}")]
    UriParse(#[from] ::url::ParseError),

    #[error("Journal error: {0}")]
    Journal(#[from] journal::JournalError),

    #[error("Seen-filter error: {0}")]
    Seen(#[from] seen::SeenError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Frontier has been terminated")]
    Terminated,

    #[error("Operation requires a paused, quiescent frontier")]
    NotPaused,

    #[error("Frontier command channel closed")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URI-specific errors
#[derive(Debug, Error)]
pub enum UriError {
    #[error("Failed to parse URI: {0}")]
    Parse(String),

    #[error("Invalid URI scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing authority in URI")]
    MissingAuthority,
}

/// Result type alias for Shiori operations
pub type Result<T> = std::result::Result<T, ShioriError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URI operations
pub type UriResult<T> = std::result::Result<T, UriError>;

// Re-export commonly used types
pub use config::FrontierConfig;
pub use frontier::{Frontier, FrontierState};
pub use model::{CrawlURI, FetchStatus, Hop, SchedulingDirective};
pub use url::{canonicalize, class_key_for, QueueAssignmentPolicy};
