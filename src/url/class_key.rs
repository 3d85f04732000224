use crate::UriError;
use url::Url;

/// Computes the SURT-ordered authority for a URI
///
/// The authority is the host with its labels reversed and comma-joined,
/// plus the port when it differs from the scheme default:
///
/// - `https://news.example.com/a` → `com,example,news,`
/// - `http://example.com:8080/`   → `com,example,:8080`
///
/// SURT ordering groups related hosts lexicographically (all of
/// `com,example,*` sorts together), which is why it is the default queue
/// grouping.
pub fn surt_authority(url: &Url) -> Result<String, UriError> {
    let host = url.host_str().ok_or(UriError::MissingAuthority)?;

    let mut authority: String = host
        .to_lowercase()
        .split('.')
        .rev()
        .collect::<Vec<_>>()
        .join(",");
    authority.push(',');

    if let Some(port) = url.port() {
        authority.push_str(&format!(":{}", port));
    }

    Ok(authority)
}

/// Computes the default class key for a URI (its SURT authority)
pub fn class_key_for(url: &Url) -> Result<String, UriError> {
    surt_authority(url)
}

/// Queue-assignment policy: maps a URI to the class key of its work queue
///
/// The default behavior groups by SURT authority. A forced key collapses
/// every URI into one named queue, which is useful for single-host crawls or
/// tests. The mapping is deterministic for a given URI and configuration, so
/// re-scheduling after crash recovery reproduces the same queue.
#[derive(Debug, Clone, Default)]
pub struct QueueAssignmentPolicy {
    force_key: Option<String>,
}

impl QueueAssignmentPolicy {
    /// Creates the default per-authority policy
    pub fn new() -> Self {
        Self { force_key: None }
    }

    /// Creates a policy that assigns every URI to `key`
    pub fn forced(key: impl Into<String>) -> Self {
        Self {
            force_key: Some(key.into()),
        }
    }

    /// Returns the class key for a URI
    pub fn class_key(&self, url: &Url) -> Result<String, UriError> {
        if let Some(key) = &self.force_key {
            return Ok(key.clone());
        }
        class_key_for(url)
    }
}
