//! In-memory seen filter
//!
//! A plain HashSet of canonical keys. Fast and dependency-free, but the
//! admitted set is lost on process exit, so duplicates can be re-admitted
//! after a restart. Use the SQLite filter for crawls that must survive one.

use crate::seen::{SeenFilter, SeenResult};
use std::collections::HashSet;

/// HashSet-backed seen filter without durability
#[derive(Debug, Default)]
pub struct MemorySeenFilter {
    keys: HashSet<String>,
}

impl MemorySeenFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeenFilter for MemorySeenFilter {
    fn admit(&mut self, key: &str) -> SeenResult<bool> {
        Ok(self.keys.insert(key.to_string()))
    }

    fn count(&self) -> SeenResult<u64> {
        Ok(self.keys.len() as u64)
    }

    fn close(&mut self) -> SeenResult<()> {
        Ok(())
    }
}
