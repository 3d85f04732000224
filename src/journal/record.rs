use crate::model::CrawlURI;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One journal line: a significant event in a CrawlURI's lifecycle
///
/// `added`, `emitted`, and `rescheduled` are progress events; the three
/// `finished-*` variants are terminal. Status values use
/// [`FetchStatus::code`](crate::model::FetchStatus::code) numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum JournalRecord {
    /// First scheduled (admitted past the already-seen filter)
    Added {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
        class_key: String,
        path_from_seed: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        via: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        via_context: Option<String>,
    },

    /// Handed to a fetch worker
    Emitted {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
    },

    /// Transient failure; re-enqueued for another attempt
    Rescheduled {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
        attempts: u32,
        status: i32,
    },

    /// Terminal: fetched successfully
    FinishedSuccess {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
        status: i32,
        content_size: u64,
    },

    /// Terminal: failed permanently
    FinishedFailure {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
        status: i32,
    },

    /// Terminal: disregarded (excluded, not failed)
    FinishedDisregard {
        at: DateTime<Utc>,
        uri: String,
        ordinal: u64,
        status: i32,
    },
}

impl JournalRecord {
    pub fn added(curi: &CrawlURI) -> Self {
        JournalRecord::Added {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            class_key: curi.class_key().unwrap_or_default().to_string(),
            path_from_seed: curi.path_from_seed.clone(),
            via: curi.via.as_ref().map(|v| v.to_string()),
            via_context: curi.via_context.clone(),
        }
    }

    pub fn emitted(curi: &CrawlURI) -> Self {
        JournalRecord::Emitted {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
        }
    }

    pub fn rescheduled(curi: &CrawlURI) -> Self {
        JournalRecord::Rescheduled {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            attempts: curi.fetch_attempts,
            status: curi.fetch_status.code(),
        }
    }

    pub fn finished_success(curi: &CrawlURI) -> Self {
        JournalRecord::FinishedSuccess {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            status: curi.fetch_status.code(),
            content_size: curi.content_size,
        }
    }

    pub fn finished_failure(curi: &CrawlURI) -> Self {
        JournalRecord::FinishedFailure {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            status: curi.fetch_status.code(),
        }
    }

    pub fn finished_disregard(curi: &CrawlURI) -> Self {
        JournalRecord::FinishedDisregard {
            at: Utc::now(),
            uri: curi.uri().to_string(),
            ordinal: curi.ordinal(),
            status: curi.fetch_status.code(),
        }
    }

    /// The ordinal of the CrawlURI this record is about
    pub fn ordinal(&self) -> u64 {
        match self {
            JournalRecord::Added { ordinal, .. }
            | JournalRecord::Emitted { ordinal, .. }
            | JournalRecord::Rescheduled { ordinal, .. }
            | JournalRecord::FinishedSuccess { ordinal, .. }
            | JournalRecord::FinishedFailure { ordinal, .. }
            | JournalRecord::FinishedDisregard { ordinal, .. } => *ordinal,
        }
    }

    /// True for records that end a URI's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JournalRecord::FinishedSuccess { .. }
                | JournalRecord::FinishedFailure { .. }
                | JournalRecord::FinishedDisregard { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FetchStatus;

    fn admitted() -> CrawlURI {
        let mut curi = CrawlURI::parse("https://example.com/page").unwrap();
        curi.set_class_key("com,example,".to_string());
        curi.assign_ordinal(1);
        curi
    }

    #[test]
    fn test_added_round_trip() {
        let record = JournalRecord::added(&admitted());
        let line = serde_json::to_string(&record).unwrap();
        let back: JournalRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_event_tag_names() {
        let record = JournalRecord::added(&admitted());
        let line = serde_json::to_string(&record).unwrap();
        assert!(line.contains(r#""event":"added""#));

        let mut curi = admitted();
        curi.fetch_status = FetchStatus::Success(200);
        let line = serde_json::to_string(&JournalRecord::finished_success(&curi)).unwrap();
        assert!(line.contains(r#""event":"finished-success""#));
    }

    #[test]
    fn test_terminal_classification() {
        let mut curi = admitted();
        assert!(!JournalRecord::added(&curi).is_terminal());
        assert!(!JournalRecord::emitted(&curi).is_terminal());
        assert!(!JournalRecord::rescheduled(&curi).is_terminal());

        curi.fetch_status = FetchStatus::HttpError(404);
        assert!(JournalRecord::finished_failure(&curi).is_terminal());
        assert!(JournalRecord::finished_disregard(&curi).is_terminal());
        curi.fetch_status = FetchStatus::Success(200);
        assert!(JournalRecord::finished_success(&curi).is_terminal());
    }

    #[test]
    fn test_absent_via_omitted_from_line() {
        let record = JournalRecord::added(&admitted());
        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains("via"));
    }
}
