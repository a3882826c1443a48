//! Id and slug utilities.
//!
//! Id generation is practically unique (random component + timestamp), not
//! cryptographically secure — collisions are improbable, not impossible,
//! which is acceptable at this store's scale. Slug helpers scan the full
//! collection (O(n)).

use std::collections::HashSet;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;

use crate::error::StoreError;
use crate::record::epoch_millis;
use crate::store::CollectionStore;

/// Collection scanned when no collection is given to the slug helpers.
pub const DEFAULT_SLUG_COLLECTION: &str = "pages";

/// Generate a practically-unique record id: current epoch millis (hex)
/// plus an 8-character random suffix.
#[must_use]
pub fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{:x}{}", epoch_millis(), suffix.to_lowercase())
}

impl CollectionStore {
    /// First of `base`, `base-1`, `base-2`, … whose slug is not taken in the
    /// collection (defaults to [`DEFAULT_SLUG_COLLECTION`]).
    pub async fn generate_unique_slug(
        &self,
        base: &str,
        collection: Option<&str>,
    ) -> Result<String, StoreError> {
        let collection = collection.unwrap_or(DEFAULT_SLUG_COLLECTION);
        let records = self.get(collection).await?;
        let taken: HashSet<&str> = records
            .iter()
            .filter_map(|r| r.get("slug").and_then(Value::as_str))
            .collect();

        if !taken.contains(base) {
            return Ok(base.to_string());
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{base}-{counter}");
            if !taken.contains(candidate.as_str()) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    /// Whether a slug is unused in the collection (defaults to
    /// [`DEFAULT_SLUG_COLLECTION`]).
    pub async fn is_slug_available(
        &self,
        slug: &str,
        collection: Option<&str>,
    ) -> Result<bool, StoreError> {
        let collection = collection.unwrap_or(DEFAULT_SLUG_COLLECTION);
        let records = self.get(collection).await?;
        Ok(!records
            .iter()
            .any(|r| r.get("slug").and_then(Value::as_str) == Some(slug)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::remote::memory::InMemoryContentClient;
    use serde_json::json;
    use std::sync::Arc;

    fn seeded_store(slugs: &[&str]) -> CollectionStore {
        let client = Arc::new(InMemoryContentClient::new());
        let records: Vec<Value> = slugs
            .iter()
            .enumerate()
            .map(|(i, slug)| json!({"id": format!("p{i}"), "slug": slug}))
            .collect();
        client.seed("data/pages.json", json!(records).to_string().as_bytes());
        CollectionStore::new(client, StoreConfig::default())
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert!(id.len() > 8);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_id_unlikely_collision() {
        let ids: HashSet<String> = (0..100).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn test_slug_without_collision() {
        let store = seeded_store(&["home"]);
        let slug = store.generate_unique_slug("about", None).await.unwrap();
        assert_eq!(slug, "about");
    }

    #[tokio::test]
    async fn test_slug_skips_taken_candidates() {
        let store = seeded_store(&["acme", "acme-1"]);
        let slug = store.generate_unique_slug("acme", None).await.unwrap();
        assert_eq!(slug, "acme-2");
    }

    #[tokio::test]
    async fn test_is_slug_available() {
        let store = seeded_store(&["home"]);
        assert!(!store.is_slug_available("home", None).await.unwrap());
        assert!(store.is_slug_available("about", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_explicit_collection() {
        let client = Arc::new(InMemoryContentClient::new());
        client.seed(
            "data/posts.json",
            json!([{"id": "p1", "slug": "hello"}]).to_string().as_bytes(),
        );
        let store = CollectionStore::new(client, StoreConfig::default());

        assert!(!store.is_slug_available("hello", Some("posts")).await.unwrap());
        let slug = store
            .generate_unique_slug("hello", Some("posts"))
            .await
            .unwrap();
        assert_eq!(slug, "hello-1");
    }
}
