use crate::config::QueueConfig;
use std::collections::HashMap;

/// Assigns and refreshes work-queue precedence values
///
/// Precedence is a total order used only to break ties among ready queues;
/// lower values dispatch first. It never overrides a queue's wake-time gate.
pub trait PrecedencePolicy: Send {
    /// Precedence for a queue seen for the first time
    fn queue_created(&self, class_key: &str) -> i32;

    /// Refreshed precedence for an existing queue
    fn queue_reevaluate(&self, class_key: &str, _current: i32) -> i32 {
        self.queue_created(class_key)
    }
}

/// Constant base precedence with per-authority overrides from configuration
#[derive(Debug, Clone)]
pub struct BasePrecedencePolicy {
    base: i32,
    overrides: HashMap<String, i32>,
}

impl BasePrecedencePolicy {
    pub fn new(base: i32) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            base: config.base_precedence,
            overrides: config
                .precedence_overrides
                .iter()
                .map(|o| (o.authority.clone(), o.precedence))
                .collect(),
        }
    }
}

impl PrecedencePolicy for BasePrecedencePolicy {
    fn queue_created(&self, class_key: &str) -> i32 {
        self.overrides.get(class_key).copied().unwrap_or(self.base)
    }
}
