//! Bulk import: re-seeding the frontier outside normal discovery
//!
//! Two sources are supported: whitespace-delimited seed/import lines
//! (URI, hop path, via, via context) and a prior run's recovery journal.
//! Imported URIs flow through the ordinary scheduling path, so the
//! already-seen filter still decides admission unless an entry is forced.

use crate::frontier::manager::Frontier;
use crate::journal;
use crate::model::CrawlURI;
use crate::Result;
use std::path::Path;
use url::Url;

/// One URI to import, with optional provenance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportEntry {
    pub uri: String,
    pub path_from_seed: String,
    pub via: Option<String>,
    pub via_context: Option<String>,

    /// Bypass the already-seen filter for this entry
    pub force: bool,
}

impl ImportEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }
}

/// Parses import lines: `URI [hop-path [via [via-context]]]`
///
/// Blank lines and `#` comments are skipped. A `-` placeholder leaves a
/// field empty, so a via-context can be given without a via.
pub fn parse_seeds(text: &str) -> Vec<ImportEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let Some(uri) = fields.next() else { continue };

        let field = |value: Option<&str>| {
            value
                .filter(|v| *v != "-")
                .map(str::to_string)
        };
        entries.push(ImportEntry {
            uri: uri.to_string(),
            path_from_seed: field(fields.next()).unwrap_or_default(),
            via: field(fields.next()),
            via_context: field(fields.next()),
            force: false,
        });
    }
    entries
}

impl Frontier {
    /// Schedules a batch of import entries, returning how many were
    /// submitted. Malformed entries are logged and skipped; admission is
    /// still decided by the already-seen filter unless an entry is forced.
    pub async fn import_entries(&self, entries: Vec<ImportEntry>) -> Result<u64> {
        let mut submitted = 0u64;
        for entry in entries {
            let mut curi = match CrawlURI::parse(&entry.uri) {
                Ok(curi) => curi,
                Err(e) => {
                    tracing::warn!(target: "shiori::uri_errors", uri = %entry.uri, error = %e, "import entry dropped");
                    continue;
                }
            };
            curi.path_from_seed = entry.path_from_seed;
            curi.via = entry.via.as_deref().and_then(|v| Url::parse(v).ok());
            curi.via_context = entry.via_context;
            curi.force_fetch = entry.force;
            self.schedule(curi).await?;
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Re-seeds from a prior run's journal: every URI the journal shows as
    /// added or rescheduled without a terminal record is scheduled again,
    /// with its retry budget carried over
    pub async fn import_journal(&self, path: &Path) -> Result<u64> {
        let pending = journal::replay(path)?;
        let mut submitted = 0u64;
        for record in pending {
            let mut curi = match CrawlURI::parse(&record.uri) {
                Ok(curi) => curi,
                Err(e) => {
                    tracing::warn!(target: "shiori::uri_errors", uri = %record.uri, error = %e, "journal entry dropped");
                    continue;
                }
            };
            curi.path_from_seed = record.path_from_seed;
            curi.via = record.via.as_deref().and_then(|v| Url::parse(v).ok());
            curi.via_context = record.via_context;
            curi.fetch_attempts = record.attempts;
            self.schedule(curi).await?;
            submitted += 1;
        }
        Ok(submitted)
    }
}
