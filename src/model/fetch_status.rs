use serde::{Deserialize, Serialize};

/// Outcome of one crawl attempt
///
/// HTTP outcomes carry the positive status code; internal outcomes map to
/// negative codes via [`FetchStatus::code`] for logs and reports. A URI that
/// has never been handed to a fetch worker is `Unattempted` (code 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    /// No fetch has been attempted yet
    Unattempted,
    /// Terminal HTTP success (2xx/3xx the worker chose not to follow further)
    Success(u16),
    /// Terminal HTTP error (4xx/5xx)
    HttpError(u16),
    /// TCP connection could not be established
    ConnectFailed,
    /// Connection dropped mid-transfer
    ConnectLost,
    /// DNS lookup failed
    DomainUnresolvable,
    /// Worker deferred the fetch (e.g. waiting on a precondition)
    Deferred,
    /// Retries exhausted; converted from a transient failure
    TooManyRetries,
    /// Excluded by robots.txt
    RobotsPrecluded,
    /// Excluded by operator rule
    BlockedByUser,
    /// Excluded by a custom processor
    BlockedByCustomProcessor,
    /// Fell outside the configured crawl scope
    OutOfScope,
    /// Removed by the operator after scheduling
    DeletedByUser,
    /// Too many consecutive embed hops from the seed
    TooManyEmbedHops,
    /// Too many link hops from the seed
    TooManyLinkHops,
}

impl FetchStatus {
    /// Numeric code: HTTP codes as-is, internal outcomes negative, unattempted 0
    pub fn code(&self) -> i32 {
        match self {
            FetchStatus::Unattempted => 0,
            FetchStatus::Success(code) => *code as i32,
            FetchStatus::HttpError(code) => *code as i32,
            FetchStatus::DomainUnresolvable => -1,
            FetchStatus::ConnectFailed => -2,
            FetchStatus::ConnectLost => -3,
            FetchStatus::TooManyRetries => -7,
            FetchStatus::Deferred => -50,
            FetchStatus::RobotsPrecluded => -61,
            FetchStatus::BlockedByUser => -62,
            FetchStatus::TooManyEmbedHops => -63,
            FetchStatus::TooManyLinkHops => -64,
            FetchStatus::OutOfScope => -65,
            FetchStatus::BlockedByCustomProcessor => -66,
            FetchStatus::DeletedByUser => -67,
        }
    }

    /// True for completed, successful fetches
    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Success(_))
    }

    /// True for outcomes that are terminal but neither success nor failure
    ///
    /// Disregards are journaled and counted separately from failures and are
    /// never retried.
    pub fn is_disregarded(&self) -> bool {
        matches!(
            self,
            FetchStatus::RobotsPrecluded
                | FetchStatus::BlockedByUser
                | FetchStatus::BlockedByCustomProcessor
                | FetchStatus::OutOfScope
                | FetchStatus::DeletedByUser
                | FetchStatus::TooManyEmbedHops
                | FetchStatus::TooManyLinkHops
        )
    }

    /// True for transient failures that are candidates for retry
    ///
    /// A 401 is only retryable when the worker attached credential material;
    /// that check lives in the retry calculator, not here.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchStatus::ConnectFailed
                | FetchStatus::ConnectLost
                | FetchStatus::DomainUnresolvable
                | FetchStatus::Deferred
        )
    }
}

impl Default for FetchStatus {
    fn default() -> Self {
        FetchStatus::Unattempted
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStatus::Unattempted => write!(f, "unattempted"),
            FetchStatus::Success(code) => write!(f, "success({})", code),
            FetchStatus::HttpError(code) => write!(f, "http-error({})", code),
            FetchStatus::ConnectFailed => write!(f, "connect-failed"),
            FetchStatus::ConnectLost => write!(f, "connect-lost"),
            FetchStatus::DomainUnresolvable => write!(f, "domain-unresolvable"),
            FetchStatus::Deferred => write!(f, "deferred"),
            FetchStatus::TooManyRetries => write!(f, "too-many-retries"),
            FetchStatus::RobotsPrecluded => write!(f, "robots-precluded"),
            FetchStatus::BlockedByUser => write!(f, "blocked-by-user"),
            FetchStatus::BlockedByCustomProcessor => write!(f, "blocked-by-custom-processor"),
            FetchStatus::OutOfScope => write!(f, "out-of-scope"),
            FetchStatus::DeletedByUser => write!(f, "deleted-by-user"),
            FetchStatus::TooManyEmbedHops => write!(f, "too-many-embed-hops"),
            FetchStatus::TooManyLinkHops => write!(f, "too-many-link-hops"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unattempted_code_is_zero() {
        assert_eq!(FetchStatus::Unattempted.code(), 0);
    }

    #[test]
    fn test_http_codes_pass_through() {
        assert_eq!(FetchStatus::Success(200).code(), 200);
        assert_eq!(FetchStatus::HttpError(404).code(), 404);
    }

    #[test]
    fn test_internal_codes_negative() {
        assert!(FetchStatus::ConnectFailed.code() < 0);
        assert!(FetchStatus::RobotsPrecluded.code() < 0);
        assert!(FetchStatus::TooManyRetries.code() < 0);
    }

    #[test]
    fn test_disregard_set() {
        let disregards = [
            FetchStatus::RobotsPrecluded,
            FetchStatus::BlockedByUser,
            FetchStatus::BlockedByCustomProcessor,
            FetchStatus::OutOfScope,
            FetchStatus::DeletedByUser,
            FetchStatus::TooManyEmbedHops,
            FetchStatus::TooManyLinkHops,
        ];
        for status in disregards {
            assert!(status.is_disregarded(), "{status} should be a disregard");
            assert!(!status.is_transient());
            assert!(!status.is_success());
        }
    }

    #[test]
    fn test_transient_set() {
        let transients = [
            FetchStatus::ConnectFailed,
            FetchStatus::ConnectLost,
            FetchStatus::DomainUnresolvable,
            FetchStatus::Deferred,
        ];
        for status in transients {
            assert!(status.is_transient(), "{status} should be transient");
            assert!(!status.is_disregarded());
        }
    }

    #[test]
    fn test_http_error_is_neither_transient_nor_disregard() {
        let status = FetchStatus::HttpError(500);
        assert!(!status.is_transient());
        assert!(!status.is_disregarded());
        assert!(!status.is_success());
    }
}
