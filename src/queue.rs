// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-collection operation queue.
//!
//! Serializes operations by key so that at most one in-flight read and one
//! in-flight write exist per collection. Reads and writes use separate keys:
//! a read never blocks a write to the same collection, which keeps `get` a
//! best-effort snapshot rather than a linearizable read.
//!
//! Built on keyed `tokio::sync::Mutex`es — waiters are queued FIFO, which
//! gives strict ordering of writes (and of reads) per collection.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct OperationQueue {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OperationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the read slot for a collection.
    pub async fn read(&self, collection: &str) -> OwnedMutexGuard<()> {
        self.acquire(format!("read_{collection}")).await
    }

    /// Acquire the write slot for a collection.
    pub async fn write(&self, collection: &str) -> OwnedMutexGuard<()> {
        self.acquire(format!("write_{collection}")).await
    }

    async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new()
    }
}
