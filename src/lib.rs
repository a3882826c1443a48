//! # Doc Store
//!
//! A lightweight, multi-writer JSON document store persisted through a remote
//! version-controlled content repository. One text file per named collection
//! acts as a miniature table; correctness is engineered entirely client-side
//! against a backend that only offers whole-file overwrite with a version
//! precondition.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CollectionStore                         │
//! │  get / getItem / find / insert / update / delete / slugs    │
//! └─────────────────────────────────────────────────────────────┘
//!        │                        │
//!        ▼                        ▼
//! ┌──────────────────┐   ┌──────────────────────────────────────┐
//! │  Operation Queue │   │  Collection Cache (30s TTL)          │
//! │  read_/write_    │   │  {records, fetched_at, version}      │
//! │  slots per       │   │  evicted on write conflict           │
//! │  collection      │   └──────────────────────────────────────┘
//! └──────────────────┘            │
//!        │                        │
//!        ▼                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ContentClient (trait)                      │
//! │  get_file(path, ref) → (bytes, version)                     │
//! │  put_file(path, bytes, branch, expected?) → version         │
//! │      GithubContentClient │ InMemoryContentClient            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doc_store::{CollectionStore, GithubContentClient, Record, StoreConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), doc_store::StoreError> {
//!     let config = StoreConfig {
//!         owner: "acme".into(),
//!         repo: "site-content".into(),
//!         token: Some("ghp_xxx".into()),
//!         ..Default::default()
//!     };
//!     let client = Arc::new(GithubContentClient::new(
//!         config.owner.clone(),
//!         config.repo.clone(),
//!         config.token.clone(),
//!     ));
//!     let store = CollectionStore::new(client, config);
//!
//!     let page = Record::from_value(json!({"title": "Home", "slug": "home"})).unwrap();
//!     let stored = store.insert("pages", page).await?;
//!     println!("stored page {:?}", stored.id());
//!
//!     let pages = store.get("pages").await?;
//!     println!("{} pages", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees and Limits
//!
//! - **No lost updates between this store's writers**: mutations hold a
//!   per-collection write slot for the whole read-mutate-write cycle, and the
//!   version precondition catches external writers.
//! - **Reads are best-effort snapshots**: a fresh cache entry is served
//!   without a remote call, and reads never block writes.
//! - **Soft-fail reads**: remote failures on `get` are logged and masked as
//!   an empty list.
//! - No schema validation, no multi-collection transactions, no durability
//!   beyond the remote content host.
//!
//! ## Modules
//!
//! - [`store`]: the [`CollectionStore`] public surface
//! - [`remote`]: content-client trait, GitHub and in-memory backends
//! - [`cache`]: per-collection TTL read cache
//! - [`queue`]: per-collection read/write serialization
//! - [`retry`]: injectable conflict retry policy
//! - [`session`]: in-memory login/register/OTP/reset flows
//! - [`slug`]: id generation and collision-avoiding slugs

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queue;
pub mod record;
pub mod remote;
pub mod retry;
pub mod session;
pub mod slug;
pub mod store;

pub use cache::CacheStats;
pub use config::StoreConfig;
pub use error::StoreError;
pub use record::Record;
pub use remote::github::GithubContentClient;
pub use remote::memory::InMemoryContentClient;
pub use remote::{ContentClient, RemoteError, RemoteFile, VersionToken};
pub use retry::RetryPolicy;
pub use session::{PasswordHasher, PlaintextHasher, Session, SessionStore, Sha256Hasher};
pub use slug::{generate_id, DEFAULT_SLUG_COLLECTION};
pub use store::CollectionStore;
