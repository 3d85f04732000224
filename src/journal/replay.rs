use crate::journal::{JournalRecord, JournalResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A URI the journal shows as scheduled but never terminally finished
///
/// Replaying after a crash yields these in original scheduling order; they
/// are re-submitted through the normal admission path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUri {
    pub uri: String,
    pub ordinal: u64,
    pub path_from_seed: String,
    pub via: Option<String>,
    pub via_context: Option<String>,
    pub attempts: u32,
}

/// Record counts per event type, for the audit report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JournalStats {
    pub added: u64,
    pub emitted: u64,
    pub rescheduled: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub disregarded: u64,
    pub malformed_lines: u64,
}

impl JournalStats {
    pub fn total_records(&self) -> u64 {
        self.added + self.emitted + self.rescheduled + self.terminal()
    }

    pub fn terminal(&self) -> u64 {
        self.succeeded + self.failed + self.disregarded
    }
}

impl std::fmt::Display for JournalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Journal: {} added, {} emitted, {} rescheduled, {} succeeded, {} failed, {} disregarded ({} malformed lines)",
            self.added,
            self.emitted,
            self.rescheduled,
            self.succeeded,
            self.failed,
            self.disregarded,
            self.malformed_lines
        )
    }
}

/// Replays a journal, returning the URIs still pending at the last record
///
/// An `added` or `rescheduled` record marks a URI pending; a terminal record
/// clears it. `emitted` records are deliberately ignored: a URI that was
/// with a worker when the process died is still unfinished work. Malformed
/// lines (a torn final write after a crash) are counted and skipped.
///
/// Replay is a pure read; running it twice over the same file yields the
/// same pending set.
pub fn replay(path: &Path) -> JournalResult<Vec<PendingUri>> {
    let mut pending: BTreeMap<u64, PendingUri> = BTreeMap::new();

    scan(path, |record| match record {
        JournalRecord::Added {
            uri,
            ordinal,
            path_from_seed,
            via,
            via_context,
            ..
        } => {
            pending.insert(
                ordinal,
                PendingUri {
                    uri,
                    ordinal,
                    path_from_seed,
                    via,
                    via_context,
                    attempts: 0,
                },
            );
        }
        JournalRecord::Rescheduled {
            uri,
            ordinal,
            attempts,
            ..
        } => {
            pending
                .entry(ordinal)
                .and_modify(|p| p.attempts = attempts)
                .or_insert_with(|| PendingUri {
                    uri,
                    ordinal,
                    path_from_seed: String::new(),
                    via: None,
                    via_context: None,
                    attempts,
                });
        }
        JournalRecord::Emitted { .. } => {}
        terminal => {
            pending.remove(&terminal.ordinal());
        }
    })?;

    Ok(pending.into_values().collect())
}

/// Counts records per event type for the audit report
pub fn audit(path: &Path) -> JournalResult<JournalStats> {
    let mut stats = JournalStats::default();

    let malformed = scan(path, |record| match record {
        JournalRecord::Added { .. } => stats.added += 1,
        JournalRecord::Emitted { .. } => stats.emitted += 1,
        JournalRecord::Rescheduled { .. } => stats.rescheduled += 1,
        JournalRecord::FinishedSuccess { .. } => stats.succeeded += 1,
        JournalRecord::FinishedFailure { .. } => stats.failed += 1,
        JournalRecord::FinishedDisregard { .. } => stats.disregarded += 1,
    })?;

    stats.malformed_lines = malformed;
    Ok(stats)
}

/// Reads a journal line by line, feeding parsed records to `handle`;
/// returns the number of malformed lines skipped
fn scan(path: &Path, mut handle: impl FnMut(JournalRecord)) -> JournalResult<u64> {
    let file = File::open(path).map_err(|source| crate::journal::JournalError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut malformed = 0u64;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalRecord>(&line) {
            Ok(record) => handle(record),
            Err(e) => {
                malformed += 1;
                tracing::warn!(
                    line = line_no + 1,
                    error = %e,
                    "skipping malformed journal line"
                );
            }
        }
    }

    Ok(malformed)
}
