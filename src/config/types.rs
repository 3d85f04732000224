use serde::{Deserialize, Serialize};

/// Main configuration structure for the frontier
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrontierConfig {
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub attributes: AttributeKeysConfig,
}

/// Politeness delay configuration
///
/// After a fetch completes, the owning work queue is snoozed for
/// `clamp(delay_factor * fetch_duration, min_delay_ms, max_delay_ms)`.
/// When a per-host bandwidth cap is set, the snooze is additionally floored
/// at the time needed to amortize the bytes just transferred.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolitenessConfig {
    /// Multiplier applied to the duration of the last fetch
    #[serde(rename = "delay-factor")]
    pub delay_factor: f64,

    /// Minimum delay between fetches to the same class key (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Maximum delay between fetches to the same class key (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Per-host bandwidth cap in KB/s; 0 disables the cap
    #[serde(rename = "max-per-host-bandwidth-kb", default)]
    pub max_per_host_bandwidth_kb: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            delay_factor: 5.0,
            min_delay_ms: 3000,
            max_delay_ms: 30000,
            max_per_host_bandwidth_kb: 0,
        }
    }
}

/// Retry configuration for transient fetch failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum fetch attempts before a transient failure becomes permanent
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before a retryable URI becomes eligible again (seconds)
    #[serde(rename = "retry-delay-seconds")]
    pub retry_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_seconds: 900,
        }
    }
}

/// Channel sizing for the manager's producer/consumer boundaries
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    /// Capacity of the outbound (ready-to-fetch) channel
    #[serde(rename = "outbound-capacity")]
    pub outbound_capacity: usize,

    /// Inbound command channel capacity = outbound capacity times this
    #[serde(rename = "inbound-multiple")]
    pub inbound_multiple: usize,
}

impl ChannelConfig {
    /// Derived capacity of the inbound command channel
    pub fn inbound_capacity(&self) -> usize {
        self.outbound_capacity * self.inbound_multiple
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 40,
            inbound_multiple: 3,
        }
    }
}

/// Recovery journal configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalConfig {
    /// Path to the append-only journal file
    #[serde(rename = "path")]
    pub path: String,

    /// Whether journaling is enabled at all
    #[serde(rename = "enabled", default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: "./frontier-journal.jsonl".to_string(),
            enabled: true,
        }
    }
}

/// Queue assignment and precedence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Precedence assigned to newly created queues (lower runs first)
    #[serde(rename = "base-precedence")]
    pub base_precedence: i32,

    /// Forces every URI into a single named queue when set
    #[serde(rename = "force-class-key", default)]
    pub force_class_key: Option<String>,

    /// Per-authority precedence overrides
    #[serde(rename = "precedence-overrides", default)]
    pub precedence_overrides: Vec<PrecedenceOverride>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_precedence: 3,
            force_class_key: None,
            precedence_overrides: Vec::new(),
        }
    }
}

/// A precedence override for one SURT authority
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrecedenceOverride {
    /// SURT authority the override applies to (e.g. "com,example,")
    pub authority: String,

    /// Precedence value for that authority's queue
    pub precedence: i32,
}

/// Attribute-bag key registry
///
/// Keys listed here are copied to child CrawlURIs (heritable) or survive the
/// per-pass reset between processing-chain runs (persistent). The registry is
/// fixed at frontier construction; there is no process-global key list.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AttributeKeysConfig {
    /// Keys propagated to child CrawlURIs
    #[serde(default)]
    pub heritable: Vec<String>,

    /// Keys preserved across processing_cleanup
    #[serde(default)]
    pub persistent: Vec<String>,
}
