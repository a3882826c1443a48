//! Store error taxonomy.
//!
//! Callers branch on the error kind, never on message text:
//! - [`StoreError::NotFound`] — a record that must exist does not.
//! - [`StoreError::Conflict`] — a write lost the optimistic-concurrency race
//!   and exhausted its retry budget.
//! - [`StoreError::Auth`] — domain/credential failures; never retried.
//! - [`StoreError::Transient`] — remote failures that are neither absence nor
//!   a version conflict; masked on reads, surfaced on writes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("write conflict on '{collection}' after {attempts} attempts")]
    Conflict { collection: String, attempts: usize },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("remote backend error: {0}")]
    Transient(String),
}
