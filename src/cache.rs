// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection read cache.
//!
//! One entry per collection: the decoded records, the fetch instant, and the
//! version token the backend reported. An entry is trusted only within the
//! TTL window; it is evicted immediately when a write conflict is detected
//! for its collection.
//!
//! The version token outlives freshness: even a TTL-expired token is a valid
//! optimistic-concurrency precondition, since a stale token simply makes the
//! write path refresh and retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::record::Record;
use crate::remote::VersionToken;

#[derive(Clone, Debug)]
struct CacheEntry {
    records: Vec<Record>,
    fetched_at: Instant,
    version: VersionToken,
}

pub struct CollectionCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub entry_count: usize,
    pub hit_rate: f64,
}

impl CollectionCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
        }
    }

    /// Records for a collection, if the entry is within the TTL window.
    pub fn fresh(&self, collection: &str) -> Option<Vec<Record>> {
        if let Some(entry) = self.entries.get(collection) {
            if entry.fetched_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.records.clone());
            }
            self.stale.fetch_add(1, Ordering::Relaxed);
            drop(entry); // Release read lock before removing
            self.entries.remove(collection);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Last known version token for a collection, regardless of freshness.
    pub fn version(&self, collection: &str) -> Option<VersionToken> {
        self.entries.get(collection).map(|e| e.version.clone())
    }

    /// Store records and the version token the backend just reported.
    pub fn put(&self, collection: &str, records: Vec<Record>, version: VersionToken) {
        self.entries.insert(
            collection.to_string(),
            CacheEntry {
                records,
                fetched_at: Instant::now(),
                version,
            },
        );
    }

    /// Evict a collection's entry (on write conflict).
    pub fn invalidate(&self, collection: &str) {
        self.entries.remove(collection);
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            stale: self.stale.load(Ordering::Relaxed),
            entry_count: self.entries.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::from_value(json!({"id": format!("r{i}")})).unwrap())
            .collect()
    }

    fn token(s: &str) -> VersionToken {
        VersionToken::new(s)
    }

    #[test]
    fn test_fresh_hit_within_ttl() {
        let cache = CollectionCache::new(Duration::from_secs(30));
        cache.put("widgets", records(2), token("v1"));

        let result = cache.fresh("widgets");
        assert_eq!(result.unwrap().len(), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_miss_when_absent() {
        let cache = CollectionCache::new(Duration::from_secs(30));

        assert!(cache.fresh("widgets").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_stale_and_evicted() {
        let cache = CollectionCache::new(Duration::ZERO);
        cache.put("widgets", records(1), token("v1"));

        assert!(cache.fresh("widgets").is_none());

        let stats = cache.stats();
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.entry_count, 0);
    }

    #[test]
    fn test_version_survives_ttl_expiry() {
        let cache = CollectionCache::new(Duration::ZERO);
        cache.put("widgets", records(1), token("v1"));

        // Token is usable as a precondition even though records are stale
        assert_eq!(cache.version("widgets"), Some(token("v1")));
    }

    #[test]
    fn test_invalidate_drops_entry_and_token() {
        let cache = CollectionCache::new(Duration::from_secs(30));
        cache.put("widgets", records(1), token("v1"));

        cache.invalidate("widgets");

        assert!(cache.fresh("widgets").is_none());
        assert!(cache.version("widgets").is_none());
    }

    #[test]
    fn test_put_replaces_entry() {
        let cache = CollectionCache::new(Duration::from_secs(30));
        cache.put("widgets", records(1), token("v1"));
        cache.put("widgets", records(3), token("v2"));

        assert_eq!(cache.fresh("widgets").unwrap().len(), 3);
        assert_eq!(cache.version("widgets"), Some(token("v2")));
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn test_hit_rate() {
        let cache = CollectionCache::new(Duration::from_secs(30));
        cache.put("widgets", records(1), token("v1"));

        cache.fresh("widgets");
        cache.fresh("widgets");
        cache.fresh("widgets");
        cache.fresh("gadgets");

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < 0.01);
    }
}
