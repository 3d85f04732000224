//! Checkpointing: point-in-time frontier snapshots
//!
//! A snapshot captures everything needed to resume a paused crawl in a new
//! process: queue contents, the ordinal counter, progress counters, and the
//! journal location. Snapshots are only taken while the frontier is paused,
//! so there is never in-flight work to represent.
//!
//! The snapshot is one JSON file in the checkpoint directory. Paths inside it
//! are recorded as written; [`FrontierSnapshot::translate_paths`] rewrites
//! them when a checkpoint is moved to another machine or directory.

use crate::model::{CrawlURI, SchedulingDirective};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

/// File name of the snapshot within the checkpoint directory
pub const SNAPSHOT_FILE: &str = "frontier-snapshot.json";

const SNAPSHOT_VERSION: u32 = 1;

/// Errors from checkpoint save/restore
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {0} (expected {SNAPSHOT_VERSION})")]
    Version(u32),

    #[error("Snapshot contains an invalid URI: {0}")]
    InvalidUri(String),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

/// Lifetime progress counters carried across a restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub queued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub disregarded: u64,
}

/// One queued URI, reduced to the fields scheduling needs
///
/// Fetch-outcome state is deliberately absent: a queued URI has none, and a
/// retried URI's attempt count is the only thing its next attempt needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriSnapshot {
    pub uri: String,
    pub ordinal: u64,
    pub path_from_seed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_context: Option<String>,
    pub scheduling_directive: SchedulingDirective,
    pub precedence: i32,
    pub fetch_attempts: u32,
    pub deferrals: u32,
}

impl UriSnapshot {
    pub fn from_curi(curi: &CrawlURI) -> Self {
        Self {
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            path_from_seed: curi.path_from_seed.clone(),
            via: curi.via.as_ref().map(|v| v.to_string()),
            via_context: curi.via_context.clone(),
            scheduling_directive: curi.scheduling_directive,
            precedence: curi.precedence,
            fetch_attempts: curi.fetch_attempts,
            deferrals: curi.deferrals,
        }
    }

    /// Rebuilds the work item, re-assigning the given class key
    pub fn into_curi(self, class_key: &str) -> CheckpointResult<CrawlURI> {
        let url = Url::parse(&self.uri).map_err(|_| CheckpointError::InvalidUri(self.uri.clone()))?;
        let mut curi = CrawlURI::new(url);
        curi.path_from_seed = self.path_from_seed;
        curi.via = match self.via {
            Some(via) => {
                Some(Url::parse(&via).map_err(|_| CheckpointError::InvalidUri(via.clone()))?)
            }
            None => None,
        };
        curi.via_context = self.via_context;
        curi.scheduling_directive = self.scheduling_directive;
        curi.precedence = self.precedence;
        curi.fetch_attempts = self.fetch_attempts;
        curi.deferrals = self.deferrals;
        curi.set_class_key(class_key.to_string());
        curi.assign_ordinal(self.ordinal);
        Ok(curi)
    }
}

/// One work queue's snapshotted contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub key: String,
    pub precedence: i32,
    pub items: Vec<UriSnapshot>,
}

/// The whole frontier, frozen at a pause point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    pub journal_path: String,
    pub next_ordinal: u64,
    pub counters: CounterSnapshot,
    pub queues: Vec<QueueSnapshot>,
}

impl FrontierSnapshot {
    pub fn new(
        config_hash: Option<String>,
        journal_path: String,
        next_ordinal: u64,
        counters: CounterSnapshot,
        queues: Vec<QueueSnapshot>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            config_hash,
            journal_path,
            next_ordinal,
            counters,
            queues,
        }
    }

    /// Writes the snapshot into `dir`, creating the directory if needed
    pub fn save(&self, dir: &Path) -> CheckpointResult<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(SNAPSHOT_FILE), json)?;
        Ok(())
    }

    /// Reads a snapshot back from `dir`, rejecting unknown versions
    pub fn load(dir: &Path) -> CheckpointResult<Self> {
        let json = std::fs::read_to_string(dir.join(SNAPSHOT_FILE))?;
        let snapshot: FrontierSnapshot = serde_json::from_str(&json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CheckpointError::Version(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Rewrites recorded filesystem paths rooted at `old_root` to `new_root`,
    /// for restoring a checkpoint copied to a different location
    pub fn translate_paths(&mut self, old_root: &Path, new_root: &Path) {
        if let Ok(rest) = Path::new(&self.journal_path).strip_prefix(old_root) {
            self.journal_path = new_root.join(rest).display().to_string();
        }
    }

    /// Total URIs resident across all snapshotted queues
    pub fn uri_count(&self) -> u64 {
        self.queues.iter().map(|q| q.items.len() as u64).sum()
    }
}
