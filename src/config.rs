//! Configuration for the collection registry.
//!
//! # Example
//!
//! ```
//! use collection_registry::RegistryConfig;
//!
//! // Minimal config (uses defaults)
//! let config = RegistryConfig::default();
//! assert_eq!(config.connectivity_timeout_ms, 5000);
//! assert_eq!(config.default_collections, vec!["users", "_app_registry"]);
//!
//! // Custom defaults for the listing view
//! let config = RegistryConfig {
//!     default_collections: vec!["users".into(), "tenants".into()],
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::registry::REGISTRY_COLLECTION;
use crate::resilience::retry::RetryConfig;

/// Configuration for the registry, smart writes and diagnostics.
///
/// All fields have defaults; the registry collection and manifest document
/// id are fixed and not part of the config.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Collections that are always listed, regardless of registry state
    #[serde(default = "default_collections")]
    pub default_collections: Vec<String>,

    /// Wall-clock budget for the connectivity test (default: 5000 ms)
    #[serde(default = "default_connectivity_timeout_ms")]
    pub connectivity_timeout_ms: u64,

    /// Collection the connectivity test writes its probe document into
    #[serde(default = "default_diagnostics_collection")]
    pub diagnostics_collection: String,

    /// Optimistic merge fallback: attempt cap, `None` (the default) retries
    /// conflicts until the merge lands. Every conflict means another
    /// registration committed, so the loop always makes progress.
    #[serde(default)]
    pub merge_max_retries: Option<usize>,
    #[serde(default = "default_merge_initial_delay_ms")]
    pub merge_initial_delay_ms: u64,
    #[serde(default = "default_merge_max_delay_ms")]
    pub merge_max_delay_ms: u64,
    /// Random extra of up to this many ms on every merge backoff
    #[serde(default = "default_merge_jitter_ms")]
    pub merge_jitter_ms: u64,
}

fn default_collections() -> Vec<String> {
    vec!["users".to_string(), REGISTRY_COLLECTION.to_string()]
}
fn default_connectivity_timeout_ms() -> u64 { 5000 }
fn default_diagnostics_collection() -> String { "_diagnostics".to_string() }
fn default_merge_initial_delay_ms() -> u64 { 10 }
fn default_merge_max_delay_ms() -> u64 { 200 }
fn default_merge_jitter_ms() -> u64 { 20 }

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_collections: default_collections(),
            connectivity_timeout_ms: default_connectivity_timeout_ms(),
            diagnostics_collection: default_diagnostics_collection(),
            merge_max_retries: None,
            merge_initial_delay_ms: default_merge_initial_delay_ms(),
            merge_max_delay_ms: default_merge_max_delay_ms(),
            merge_jitter_ms: default_merge_jitter_ms(),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    /// Backoff used when the store has no native set-union primitive.
    #[must_use]
    pub fn merge_retry(&self) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(self.merge_initial_delay_ms),
            max_delay: Duration::from_millis(self.merge_max_delay_ms),
            factor: 2.0,
            jitter: Duration::from_millis(self.merge_jitter_ms),
            max_retries: self.merge_max_retries.map(|max| max.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.default_collections, vec!["users", "_app_registry"]);
        assert_eq!(config.connectivity_timeout(), Duration::from_secs(5));
        assert_eq!(config.diagnostics_collection, "_diagnostics");
        assert_eq!(config.merge_max_retries, None);
        assert_eq!(config.merge_jitter_ms, 20);
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let config: RegistryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_collections, RegistryConfig::default().default_collections);
        assert_eq!(config.connectivity_timeout_ms, 5000);
    }

    #[test]
    fn test_deserialize_overrides() {
        let config: RegistryConfig = serde_json::from_str(
            r#"{"default_collections": ["tenants"], "connectivity_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.default_collections, vec!["tenants"]);
        assert_eq!(config.connectivity_timeout(), Duration::from_millis(250));
        assert_eq!(config.diagnostics_collection, "_diagnostics");
    }

    #[test]
    fn test_merge_retry_defaults_never_give_up_on_conflicts() {
        let retry = RegistryConfig::default().merge_retry();
        assert_eq!(retry.max_retries, None);
        assert_eq!(retry.initial_delay, Duration::from_millis(10));
        assert_eq!(retry.max_delay, Duration::from_millis(200));
        assert_eq!(retry.jitter, Duration::from_millis(20));
    }

    #[test]
    fn test_merge_retry_never_zero_attempts() {
        let config = RegistryConfig { merge_max_retries: Some(0), ..Default::default() };
        assert_eq!(config.merge_retry().max_retries, Some(1));
    }

    #[test]
    fn test_deserialize_merge_cap() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"merge_max_retries": 8, "merge_jitter_ms": 0}"#).unwrap();
        assert_eq!(config.merge_retry().max_retries, Some(8));
        assert_eq!(config.merge_retry().jitter, Duration::ZERO);
    }
}
