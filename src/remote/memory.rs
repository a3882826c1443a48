//! In-memory content client for tests.
//!
//! Behaves like the real backend contract: whole-file storage keyed by path,
//! content-hash version tokens, conflict on stale preconditions. Counts
//! fetches and writes so tests can assert cache behavior, and supports
//! injecting failures for retry-path tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::traits::{ContentClient, RemoteError, RemoteFile, VersionToken};

pub struct InMemoryContentClient {
    files: DashMap<String, RemoteFile>,
    fetches: AtomicU64,
    writes: AtomicU64,
    put_failures: Mutex<VecDeque<RemoteError>>,
    get_failures: Mutex<VecDeque<RemoteError>>,
}

fn content_version(content: &[u8]) -> VersionToken {
    VersionToken::new(hex::encode(Sha256::digest(content)))
}

impl InMemoryContentClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
            fetches: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            put_failures: Mutex::new(VecDeque::new()),
            get_failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Seed a file directly, bypassing counters and preconditions.
    pub fn seed(&self, path: &str, content: &[u8]) -> VersionToken {
        let version = content_version(content);
        self.files.insert(
            path.to_string(),
            RemoteFile {
                content: content.to_vec(),
                version: version.clone(),
            },
        );
        version
    }

    /// Current version of a file, if it exists.
    #[must_use]
    pub fn current_version(&self, path: &str) -> Option<VersionToken> {
        self.files.get(path).map(|f| f.version.clone())
    }

    /// Raw stored content of a file, if it exists.
    #[must_use]
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).map(|f| f.content.clone())
    }

    /// Number of `get_file` calls observed.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of `put_file` calls observed (including rejected ones).
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Queue an error for the next `put_file` call.
    pub fn fail_next_put(&self, error: RemoteError) {
        self.put_failures.lock().push_back(error);
    }

    /// Queue an error for the next `get_file` call.
    pub fn fail_next_get(&self, error: RemoteError) {
        self.get_failures.lock().push_back(error);
    }
}

impl Default for InMemoryContentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentClient for InMemoryContentClient {
    async fn get_file(&self, path: &str, _reference: &str) -> Result<RemoteFile, RemoteError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = self.get_failures.lock().pop_front() {
            return Err(error);
        }

        self.files
            .get(path)
            .map(|f| f.clone())
            .ok_or(RemoteError::NotFound)
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        _branch: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = self.put_failures.lock().pop_front() {
            return Err(error);
        }

        let current = self.files.get(path).map(|f| f.version.clone());
        match (current, expected) {
            (Some(current), Some(expected)) if *expected != current => {
                return Err(RemoteError::Conflict {
                    expected: expected.to_string(),
                });
            }
            (None, Some(expected)) => {
                // Precondition against a file that no longer exists
                return Err(RemoteError::Conflict {
                    expected: expected.to_string(),
                });
            }
            _ => {}
        }

        let version = content_version(content);
        self.files.insert(
            path.to_string(),
            RemoteFile {
                content: content.to_vec(),
                version: version.clone(),
            },
        );
        Ok(version)
    }
}
