use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("file not found")]
    NotFound,
    #[error("version precondition failed: expected {expected}")]
    Conflict { expected: String },
    #[error("remote backend error: {0}")]
    Backend(String),
}

/// Opaque marker of a document's last known persisted content.
///
/// Never interpreted — only compared and passed back as a write precondition
/// (ETag-like). The GitHub backend uses blob SHAs; the in-memory backend uses
/// a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(String);

impl VersionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetched file together with its version token.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub version: VersionToken,
}

/// The store's only persistence mechanism: whole-file read and
/// whole-file conditional overwrite against a content repository.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetch a file at `path` on `reference` (branch or ref).
    ///
    /// Returns [`RemoteError::NotFound`] when the file does not exist.
    async fn get_file(&self, path: &str, reference: &str) -> Result<RemoteFile, RemoteError>;

    /// Overwrite a file, optionally guarded by an expected version token.
    ///
    /// When `expected` is provided and no longer matches the current version,
    /// the write is rejected with [`RemoteError::Conflict`]. When `expected`
    /// is `None` the write is unconditional.
    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        branch: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError>;
}
