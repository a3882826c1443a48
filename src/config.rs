//! Configuration for the document store.
//!
//! # Example
//!
//! ```
//! use doc_store::StoreConfig;
//!
//! // Minimal config (uses defaults)
//! let config = StoreConfig::default();
//! assert_eq!(config.branch, "main");
//! assert_eq!(config.cache_ttl_ms, 30_000);
//!
//! // Full config
//! let config = StoreConfig {
//!     owner: "acme".into(),
//!     repo: "site-content".into(),
//!     token: Some("ghp_xxx".into()),
//!     base_path: "cms/data".into(),
//!     ..Default::default()
//! };
//! assert_eq!(config.document_path("pages"), "cms/data/pages.json");
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Connection and behavior parameters, passed at construction.
///
/// `owner`, `repo`, and `token` only matter for the GitHub backend; the rest
/// applies to any [`ContentClient`](crate::remote::ContentClient).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Repository owner (organization or user)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,

    /// API auth token
    #[serde(default)]
    pub token: Option<String>,

    /// Branch written to and read from (default: "main")
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Directory prefix for collection documents (default: "data")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Collection document extension (default: "json")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Read-cache TTL in milliseconds (default: 30s)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Conflict retry attempt bound (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Linear backoff base in milliseconds (default: 300)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_branch() -> String {
    "main".to_string()
}
fn default_base_path() -> String {
    "data".to_string()
}
fn default_extension() -> String {
    "json".to_string()
}
fn default_cache_ttl_ms() -> u64 {
    30_000
}
fn default_max_attempts() -> usize {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    300
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: None,
            branch: default_branch(),
            base_path: default_base_path(),
            extension: default_extension(),
            cache_ttl_ms: default_cache_ttl_ms(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl StoreConfig {
    /// Path of a collection's document: `{base_path}/{collection}.{ext}`.
    #[must_use]
    pub fn document_path(&self, collection: &str) -> String {
        format!("{}/{}.{}", self.base_path, collection, self.extension)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}
