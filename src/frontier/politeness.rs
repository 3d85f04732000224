//! Politeness and retry calculators
//!
//! Both calculators are pure functions over a finished CrawlURI and the
//! configuration, so policy is testable without a running manager.

use crate::config::{PolitenessConfig, RetryConfig};
use crate::model::{CrawlURI, FetchStatus};
use std::time::Duration;

/// Computes how long a queue must stay snoozed after a completed fetch
///
/// The wait is `delay_factor * fetch_duration`, clamped to the configured
/// bounds. When a per-host bandwidth cap is set, the wait is additionally
/// floored at the time needed to amortize the bytes just transferred at the
/// capped rate, so sustained throughput to one host never exceeds the cap.
pub fn politeness_wait(duration_ms: u64, bytes: u64, config: &PolitenessConfig) -> Duration {
    let scaled = (config.delay_factor * duration_ms as f64).round() as u64;
    let mut wait_ms = scaled.clamp(config.min_delay_ms, config.max_delay_ms);

    if config.max_per_host_bandwidth_kb > 0 {
        let floor_ms = bytes
            .saturating_mul(1000)
            .checked_div(config.max_per_host_bandwidth_kb * 1024)
            .unwrap_or(0);
        wait_ms = wait_ms.max(floor_ms);
    }

    Duration::from_millis(wait_ms)
}

/// Decides whether a just-finished CrawlURI should be retried
///
/// Retries stop once `fetch_attempts` reaches the configured maximum. Below
/// that bound, transient outcomes (connect failed/lost, DNS failure,
/// deferral) are retried, and a 401 is retried only when the worker attached
/// new credential material. Successes, permanent errors, and disregarded
/// outcomes are never retried.
pub fn needs_retrying(curi: &CrawlURI, config: &RetryConfig) -> bool {
    if curi.fetch_attempts >= config.max_retries {
        return false;
    }

    match curi.fetch_status {
        status if status.is_transient() => true,
        FetchStatus::HttpError(401) => curi.retry_with_credentials,
        _ => false,
    }
}
