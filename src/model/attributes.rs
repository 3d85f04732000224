use crate::config::AttributeKeysConfig;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Registry of attribute keys with special lifetimes
///
/// Owned by the frontier and passed explicitly wherever attribute lifecycle
/// decisions are made. Heritable keys are copied onto child CrawlURIs;
/// persistent keys survive the reset between processing-chain passes. The
/// registry is fixed before any CrawlURI is constructed.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    heritable: HashSet<String>,
    persistent: HashSet<String>,
}

impl AttributeRegistry {
    /// Builds a registry from configuration
    pub fn from_config(config: &AttributeKeysConfig) -> Self {
        Self {
            heritable: config.heritable.iter().cloned().collect(),
            persistent: config.persistent.iter().cloned().collect(),
        }
    }

    /// Builds a registry from explicit key lists
    pub fn new(
        heritable: impl IntoIterator<Item = String>,
        persistent: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            heritable: heritable.into_iter().collect(),
            persistent: persistent.into_iter().collect(),
        }
    }

    /// Whether `key` propagates to child CrawlURIs
    pub fn is_heritable(&self, key: &str) -> bool {
        self.heritable.contains(key)
    }

    /// Whether `key` survives processing_cleanup
    pub fn is_persistent(&self, key: &str) -> bool {
        self.persistent.contains(key)
    }
}

/// Open key→value bag carried on every CrawlURI
///
/// Processors stash per-URI state here; the frontier itself only consults
/// the bag through the registry's heritable/persistent rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    map: BTreeMap<String, Value>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(key.into(), value.into());
    }

    /// Gets an attribute value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    /// Removes an attribute, returning its value if present
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Iterates over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    /// Drops every key the registry does not mark heritable or persistent
    ///
    /// Called during the per-pass reset between processing-chain runs.
    pub fn retain_registered(&mut self, registry: &AttributeRegistry) {
        self.map
            .retain(|key, _| registry.is_heritable(key) || registry.is_persistent(key));
    }

    /// Copies heritable entries into a child's bag
    pub fn inherit_into(&self, child: &mut AttributeBag, registry: &AttributeRegistry) {
        for (key, value) in &self.map {
            if registry.is_heritable(key) {
                child.map.insert(key.clone(), value.clone());
            }
        }
    }
}
