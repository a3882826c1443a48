//! Remote content clients.
//!
//! The store persists through the [`ContentClient`] trait: whole-file reads
//! and conditional whole-file overwrites against a version-controlled content
//! repository. [`github::GithubContentClient`] is the production backend;
//! [`memory::InMemoryContentClient`] backs the test suite.

pub mod github;
pub mod memory;
pub mod traits;

pub use traits::{ContentClient, RemoteError, RemoteFile, VersionToken};
