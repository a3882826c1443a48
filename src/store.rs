// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collection store.
//!
//! The public data-access surface: whole-collection reads with a short-lived
//! cache, and read-modify-write mutations with optimistic-concurrency retry.
//!
//! # Write path
//!
//! ```text
//! insert/update/delete
//!       │
//!       ▼
//! ┌───────────────────────────────┐
//! │ acquire write slot            │   one in-flight write per collection
//! │   load records (cache/fetch)  │
//! │   mutate in memory            │
//! │   save_locked:                │
//! │     expected = cached token   │
//! │       (or fetch current)      │
//! │     conditional put ──────────┼─→ conflict? evict cache, linear
//! │     update cache on success   │   backoff, retry (bounded)
//! └───────────────────────────────┘
//! ```
//!
//! The whole read-mutate-write cycle runs under one write slot, so concurrent
//! mutations of the same collection can never observe the same base list.
//! Reads use a separate slot and stay best-effort snapshots.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CollectionCache};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::queue::OperationQueue;
use crate::record::Record;
use crate::remote::{ContentClient, RemoteError};
use crate::retry::RetryPolicy;
use crate::slug::generate_id;

pub struct CollectionStore {
    client: Arc<dyn ContentClient>,
    config: StoreConfig,
    cache: CollectionCache,
    queue: OperationQueue,
    retry: RetryPolicy,
}

impl CollectionStore {
    /// Create a store over any content client.
    ///
    /// Cache, queue, and retry policy are owned by the instance — multiple
    /// independent stores never share state.
    #[must_use]
    pub fn new(client: Arc<dyn ContentClient>, config: StoreConfig) -> Self {
        let cache = CollectionCache::new(config.cache_ttl());
        let retry = config.retry_policy();
        Self {
            client,
            config,
            cache,
            queue: OperationQueue::new(),
            retry,
        }
    }

    /// Replace the retry policy (for tests and tuning).
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // --- Reads ---

    /// Full contents of a collection.
    ///
    /// Cache-fresh reads return without any remote call. Concurrent `get`s on
    /// the same stale collection coalesce into a single fetch via the read
    /// slot. An absent document is initialized as an empty array (persisted
    /// through the write path). Any other remote failure is logged and masked
    /// as an empty list — callers must tolerate soft-fail reads.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let start = Instant::now();

        if let Some(records) = self.cache.fresh(collection) {
            crate::metrics::record_operation("store", "get", "cache_hit");
            return Ok(records);
        }

        let _read = self.queue.read(collection).await;

        // A concurrent get may have completed the fetch while we waited
        if let Some(records) = self.cache.fresh(collection) {
            crate::metrics::record_operation("store", "get", "cache_hit");
            return Ok(records);
        }

        match self.fetch_collection(collection).await {
            Ok(records) => {
                crate::metrics::record_operation("store", "get", "fetch");
                crate::metrics::record_latency("store", "get", start.elapsed());
                Ok(records)
            }
            Err(RemoteError::NotFound) => {
                debug!(collection, "collection absent, initializing empty document");
                match self.save_collection(collection, Vec::new()).await {
                    Ok(()) => crate::metrics::record_operation("store", "get", "init"),
                    Err(e) => {
                        warn!(collection, error = %e, "failed to initialize collection");
                        crate::metrics::record_operation("store", "get", "init_error");
                    }
                }
                Ok(Vec::new())
            }
            Err(e) => {
                // Soft-fail read: mask as empty, callers tolerate this
                warn!(collection, error = %e, "read failed, returning empty result");
                crate::metrics::record_operation("store", "get", "soft_fail");
                Ok(Vec::new())
            }
        }
    }

    /// The record with the given id, or `None`.
    pub async fn get_item(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        let records = self.get(collection).await?;
        Ok(records.into_iter().find(|r| r.id() == Some(id)))
    }

    /// All records where every criteria key matches by equality.
    pub async fn find(
        &self,
        collection: &str,
        criteria: &Value,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.get(collection).await?;
        Ok(records.into_iter().filter(|r| r.matches(criteria)).collect())
    }

    /// First record matching the criteria, or `None`.
    pub async fn find_one(
        &self,
        collection: &str,
        criteria: &Value,
    ) -> Result<Option<Record>, StoreError> {
        let records = self.get(collection).await?;
        Ok(records.into_iter().find(|r| r.matches(criteria)))
    }

    // --- Mutations ---

    /// Append a record, generating an `id` when the record lacks one.
    /// Returns the stored record.
    #[tracing::instrument(skip(self, record))]
    pub async fn insert(&self, collection: &str, mut record: Record) -> Result<Record, StoreError> {
        let _write = self.queue.write(collection).await;

        let mut records = self.load_for_write(collection).await?;
        if record.id().is_none() {
            record.set_id(generate_id());
        }
        records.push(record.clone());
        self.save_locked(collection, records).await?;

        crate::metrics::record_operation("store", "insert", "success");
        Ok(record)
    }

    /// Merge a patch into the record with the given id and stamp `updatedAt`.
    /// Returns the merged record, or [`StoreError::NotFound`] when the id is
    /// absent — an update never silently inserts.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Record, StoreError> {
        let _write = self.queue.write(collection).await;

        let mut records = self.load_for_write(collection).await?;
        let Some(pos) = records.iter().position(|r| r.id() == Some(id)) else {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        };

        records[pos].merge(&patch);
        records[pos].stamp_updated_at();
        let updated = records[pos].clone();

        self.save_locked(collection, records).await?;

        crate::metrics::record_operation("store", "update", "success");
        Ok(updated)
    }

    /// Remove the record with the given id.
    ///
    /// Returns `Ok(false)` when no record matches (no error, no remote
    /// write); `Ok(true)` after removing exactly one record, preserving the
    /// relative order of the rest.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let _write = self.queue.write(collection).await;

        let mut records = self.load_for_write(collection).await?;
        let Some(pos) = records.iter().position(|r| r.id() == Some(id)) else {
            crate::metrics::record_operation("store", "delete", "miss");
            return Ok(false);
        };

        records.remove(pos);
        self.save_locked(collection, records).await?;

        crate::metrics::record_operation("store", "delete", "success");
        Ok(true)
    }

    /// Rewrite a collection's entire document.
    ///
    /// The public entry point takes the collection's write slot; mutation
    /// methods that already hold it go through `save_locked` directly.
    pub async fn save_collection(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<(), StoreError> {
        let _write = self.queue.write(collection).await;
        self.save_locked(collection, records).await
    }

    // --- Internals ---

    /// Load the current records for a mutation already holding the write
    /// slot. Unlike `get`, failures here are not masked: a mutation must not
    /// proceed from a fabricated empty base.
    async fn load_for_write(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        if let Some(records) = self.cache.fresh(collection) {
            return Ok(records);
        }
        match self.fetch_collection(collection).await {
            Ok(records) => Ok(records),
            Err(RemoteError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(StoreError::Transient(e.to_string())),
        }
    }

    /// Fetch and decode a collection document, populating the cache.
    async fn fetch_collection(&self, collection: &str) -> Result<Vec<Record>, RemoteError> {
        let path = self.config.document_path(collection);
        let file = self.client.get_file(&path, &self.config.branch).await?;

        let records: Vec<Record> = serde_json::from_slice(&file.content)
            .map_err(|e| RemoteError::Backend(format!("invalid collection document: {e}")))?;

        self.cache.put(collection, records.clone(), file.version);
        Ok(records)
    }

    /// Core write path. Caller must hold the collection's write slot.
    ///
    /// Conditional whole-document overwrite with bounded conflict retry:
    /// conflicts evict the cache entry, back off linearly, and re-resolve the
    /// expected token. Non-conflict remote failures surface immediately and
    /// never consume retry attempts.
    async fn save_locked(&self, collection: &str, records: Vec<Record>) -> Result<(), StoreError> {
        let path = self.config.document_path(collection);
        let body = serde_json::to_vec_pretty(&records)
            .map_err(|e| StoreError::Transient(format!("serialize {collection}: {e}")))?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let expected = match self.cache.version(collection) {
                Some(version) => Some(version),
                None => match self.client.get_file(&path, &self.config.branch).await {
                    Ok(file) => Some(file.version),
                    // Absent document: no precondition needed
                    Err(RemoteError::NotFound) => None,
                    Err(e) => return Err(StoreError::Transient(e.to_string())),
                },
            };

            match self
                .client
                .put_file(&path, &body, &self.config.branch, expected.as_ref())
                .await
            {
                Ok(version) => {
                    self.cache.put(collection, records.clone(), version);
                    crate::metrics::record_operation("store", "save", "success");
                    return Ok(());
                }
                Err(RemoteError::Conflict { .. }) => {
                    self.cache.invalidate(collection);
                    crate::metrics::record_conflict(collection);
                    warn!(collection, attempt, "write conflict, refreshing version");

                    if attempt >= self.retry.max_attempts {
                        crate::metrics::record_operation("store", "save", "conflict_exhausted");
                        return Err(StoreError::Conflict {
                            collection: collection.to_string(),
                            attempts: attempt,
                        });
                    }
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                }
                Err(e) => {
                    crate::metrics::record_operation("store", "save", "error");
                    return Err(StoreError::Transient(e.to_string()));
                }
            }
        }
    }
}
