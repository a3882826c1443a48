// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory session store.
//!
//! Login, registration, OTP, and password-reset flows layered on the
//! [`CollectionStore`]'s `users` collection. Sessions live only in process
//! memory and are lost on restart.
//!
//! Two flagged gaps, preserved deliberately:
//! - `expires_at` is recorded on every session but never checked —
//!   sessions do not actually expire under the current contract.
//! - The OTP step is a stand-in: any OTP succeeds.
//!
//! Credential verification is isolated behind [`PasswordHasher`]. The default
//! [`PlaintextHasher`] reproduces the original plaintext comparison and must
//! not be used in production; [`Sha256Hasher`] is the drop-in alternative.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{epoch_millis, Record};
use crate::slug::generate_id;
use crate::store::CollectionStore;

const USERS_COLLECTION: &str = "users";

/// Credential hashing seam.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;

    fn verify(&self, password: &str, stored: &str) -> bool {
        self.hash(password) == stored
    }
}

/// Stores and compares passwords as-is. Compatibility default only.
pub struct PlaintextHasher;

impl PasswordHasher for PlaintextHasher {
    fn hash(&self, password: &str) -> String {
        password.to_string()
    }
}

/// SHA-256 digest hashing.
pub struct Sha256Hasher;

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }
}

/// A logged-in session, held only in process memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    /// Epoch millis. Recorded but not enforced (see module docs).
    pub expires_at: i64,
    pub metadata: Value,
}

pub struct SessionStore {
    store: Arc<CollectionStore>,
    sessions: DashMap<String, Session>,
    reset_tokens: DashMap<String, String>,
    hasher: Arc<dyn PasswordHasher>,
    session_ttl: Duration,
}

impl SessionStore {
    /// Create a session store with the compatibility plaintext hasher.
    #[must_use]
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self::with_hasher(store, Arc::new(PlaintextHasher))
    }

    #[must_use]
    pub fn with_hasher(store: Arc<CollectionStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            sessions: DashMap::new(),
            reset_tokens: DashMap::new(),
            hasher,
            session_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Create a user record with defaults (roles, permissions, plan).
    ///
    /// Fails with [`StoreError::Auth`] when a user with the email exists.
    #[tracing::instrument(skip(self, password, profile))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: Value,
    ) -> Result<Record, StoreError> {
        if self.find_user(email).await?.is_some() {
            return Err(StoreError::Auth("user already exists".into()));
        }

        let user = Record::from_value(json!({
            "email": email,
            "password": self.hasher.hash(password),
            "roles": ["editor"],
            "permissions": [],
            "plan": "free",
            "profile": profile,
            "createdAt": epoch_millis(),
        }))
        .ok_or_else(|| StoreError::Transient("user record must be an object".into()))?;

        let stored = self.store.insert(USERS_COLLECTION, user).await?;
        info!(email, "registered user");
        Ok(stored)
    }

    /// Verify credentials and mint a session token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, StoreError> {
        let user = self
            .find_user(email)
            .await?
            .ok_or_else(|| StoreError::Auth("user not found".into()))?;

        let stored = user
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Auth("invalid credentials".into()))?;
        if !self.hasher.verify(password, stored) {
            return Err(StoreError::Auth("invalid credentials".into()));
        }

        Ok(self.mint_session(&user))
    }

    /// Complete an OTP login.
    ///
    /// The OTP is not checked — any value succeeds. Stand-in behavior,
    /// preserved as a flagged gap.
    #[tracing::instrument(skip(self, _otp))]
    pub async fn verify_login_otp(&self, email: &str, _otp: &str) -> Result<String, StoreError> {
        let user = self
            .find_user(email)
            .await?
            .ok_or_else(|| StoreError::Auth("user not found".into()))?;

        Ok(self.mint_session(&user))
    }

    /// Issue a password-reset token for an existing user.
    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<String, StoreError> {
        let user = self
            .find_user(email)
            .await?
            .ok_or_else(|| StoreError::Auth("user not found".into()))?;
        let user_id = user
            .id()
            .ok_or_else(|| StoreError::Transient("user record without id".into()))?;

        let token = Uuid::new_v4().simple().to_string();
        self.reset_tokens.insert(token.clone(), user_id.to_string());
        debug!(email, "issued password reset token");
        Ok(token)
    }

    /// Consume a reset token and rewrite the user's password.
    #[tracing::instrument(skip(self, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), StoreError> {
        let (_, user_id) = self
            .reset_tokens
            .remove(token)
            .ok_or_else(|| StoreError::Auth("invalid reset token".into()))?;

        let patch = Record::from_value(json!({"password": self.hasher.hash(new_password)}))
            .ok_or_else(|| StoreError::Transient("patch must be an object".into()))?;
        self.store.update(USERS_COLLECTION, &user_id, patch).await?;
        info!(user_id, "password reset");
        Ok(())
    }

    /// Look up a session by token.
    ///
    /// `expires_at` is not checked here — expired sessions are still
    /// returned (flagged gap, see module docs).
    #[must_use]
    pub fn get_session(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.clone())
    }

    /// Remove a session. Returns whether one existed.
    pub fn destroy_session(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    async fn find_user(&self, email: &str) -> Result<Option<Record>, StoreError> {
        self.store
            .find_one(USERS_COLLECTION, &json!({"email": email}))
            .await
    }

    fn mint_session(&self, user: &Record) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            id: generate_id(),
            user_id: user.id().unwrap_or_default().to_string(),
            token: token.clone(),
            expires_at: epoch_millis() + self.session_ttl.as_millis() as i64,
            metadata: json!({"email": user.get("email").cloned().unwrap_or(Value::Null)}),
        };
        self.sessions.insert(token.clone(), session);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::remote::memory::InMemoryContentClient;

    fn test_sessions() -> SessionStore {
        let client = Arc::new(InMemoryContentClient::new());
        let store = Arc::new(CollectionStore::new(client, StoreConfig::default()));
        SessionStore::new(store)
    }

    #[tokio::test]
    async fn test_register_sets_defaults() {
        let sessions = test_sessions();

        let user = sessions
            .register("alice@example.com", "secret", json!({"name": "Alice"}))
            .await
            .unwrap();

        assert!(user.id().is_some());
        assert_eq!(user.get("plan"), Some(&json!("free")));
        assert_eq!(user.get("roles"), Some(&json!(["editor"])));
        assert_eq!(user.get("profile"), Some(&json!({"name": "Alice"})));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_fails() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();

        let result = sessions
            .register("alice@example.com", "other", json!({}))
            .await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();

        let token = sessions.login("alice@example.com", "secret").await.unwrap();
        let session = sessions.get_session(&token).unwrap();
        assert_eq!(session.token, token);
        assert!(!session.user_id.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();

        let result = sessions.login("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let sessions = test_sessions();
        let result = sessions.login("nobody@example.com", "secret").await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_any_otp_succeeds_for_existing_user() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();

        // Stand-in behavior: the OTP value is irrelevant
        let token = sessions
            .verify_login_otp("alice@example.com", "000000")
            .await
            .unwrap();
        assert!(sessions.get_session(&token).is_some());

        let result = sessions.verify_login_otp("nobody@example.com", "000000").await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "old-secret", json!({}))
            .await
            .unwrap();

        let reset = sessions
            .request_password_reset("alice@example.com")
            .await
            .unwrap();
        sessions.reset_password(&reset, "new-secret").await.unwrap();

        assert!(sessions.login("alice@example.com", "old-secret").await.is_err());
        assert!(sessions.login("alice@example.com", "new-secret").await.is_ok());

        // Token is single-use
        let result = sessions.reset_password(&reset, "again").await;
        assert!(matches!(result, Err(StoreError::Auth(_))));
    }

    #[tokio::test]
    async fn test_destroy_session() {
        let sessions = test_sessions();
        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();
        let token = sessions.login("alice@example.com", "secret").await.unwrap();

        assert!(sessions.destroy_session(&token));
        assert!(sessions.get_session(&token).is_none());
        assert!(!sessions.destroy_session(&token));
    }

    #[tokio::test]
    async fn test_expired_session_is_still_returned() {
        // expires_at is recorded but never enforced - current contract
        let client = Arc::new(InMemoryContentClient::new());
        let store = Arc::new(CollectionStore::new(client, StoreConfig::default()));
        let sessions = SessionStore::new(store).with_session_ttl(Duration::ZERO);

        sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();
        let token = sessions.login("alice@example.com", "secret").await.unwrap();

        let session = sessions.get_session(&token).unwrap();
        assert!(session.expires_at <= epoch_millis());
        assert!(sessions.get_session(&token).is_some());
    }

    #[tokio::test]
    async fn test_sha256_hasher() {
        let client = Arc::new(InMemoryContentClient::new());
        let store = Arc::new(CollectionStore::new(client, StoreConfig::default()));
        let sessions = SessionStore::with_hasher(store, Arc::new(Sha256Hasher));

        let user = sessions
            .register("alice@example.com", "secret", json!({}))
            .await
            .unwrap();

        // Stored password is a digest, not the plaintext
        let stored = user.get("password").and_then(Value::as_str).unwrap();
        assert_ne!(stored, "secret");
        assert_eq!(stored.len(), 64);

        assert!(sessions.login("alice@example.com", "secret").await.is_ok());
        assert!(sessions.login("alice@example.com", "wrong").await.is_err());
    }
}
