//! Record data structure.
//!
//! A [`Record`] is an open-ended JSON object — the store imposes no schema
//! beyond a unique string `id` field. Records flow through the store as whole
//! values; mutation helpers here cover the merge and timestamp behavior the
//! store relies on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current time as epoch milliseconds.
pub(crate) fn epoch_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// An open attribute map persisted as one element of a collection document.
///
/// # Example
///
/// ```
/// use doc_store::Record;
/// use serde_json::json;
///
/// let mut record = Record::from_value(json!({"name": "Acme"})).unwrap();
/// assert!(record.id().is_none());
///
/// record.set_id("w-1".into());
/// assert_eq!(record.id(), Some("w-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON value. Returns `None` for non-objects.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The record's `id` field, if present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Set the record's `id` field.
    pub fn set_id(&mut self, id: String) {
        self.0.insert("id".to_string(), Value::String(id));
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a field value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Merge a patch into this record.
    ///
    /// Every key in the patch overwrites the corresponding field, except `id`:
    /// a record's identity never changes through a merge.
    pub fn merge(&mut self, patch: &Record) {
        for (key, value) in &patch.0 {
            if key == "id" {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Stamp the `updatedAt` field with the current time (epoch millis).
    pub fn stamp_updated_at(&mut self) {
        self.0
            .insert("updatedAt".to_string(), Value::from(epoch_millis()));
    }

    /// Equality match against criteria: true when every key in `criteria`
    /// is present with an equal value. Non-object criteria match everything.
    #[must_use]
    pub fn matches(&self, criteria: &Value) -> bool {
        match criteria.as_object() {
            Some(map) => map.iter().all(|(k, v)| self.0.get(k) == Some(v)),
            None => true,
        }
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Record::from_value(json!([1, 2, 3])).is_none());
        assert!(Record::from_value(json!("string")).is_none());
        assert!(Record::from_value(json!({"a": 1})).is_some());
    }

    #[test]
    fn test_id_accessors() {
        let mut record = Record::from_value(json!({"name": "Acme"})).unwrap();
        assert!(record.id().is_none());

        record.set_id("abc".into());
        assert_eq!(record.id(), Some("abc"));

        // Non-string id is not an id
        let record = Record::from_value(json!({"id": 42})).unwrap();
        assert!(record.id().is_none());
    }

    #[test]
    fn test_merge_overwrites_fields_but_not_id() {
        let mut record =
            Record::from_value(json!({"id": "r1", "name": "Acme", "count": 1})).unwrap();
        let patch = Record::from_value(json!({"id": "evil", "count": 2, "extra": true})).unwrap();

        record.merge(&patch);

        assert_eq!(record.id(), Some("r1"));
        assert_eq!(record.get("count"), Some(&json!(2)));
        assert_eq!(record.get("name"), Some(&json!("Acme")));
        assert_eq!(record.get("extra"), Some(&json!(true)));
    }

    #[test]
    fn test_stamp_updated_at() {
        let before = epoch_millis();
        let mut record = Record::new();
        record.stamp_updated_at();
        let after = epoch_millis();

        let stamped = record.get("updatedAt").and_then(Value::as_i64).unwrap();
        assert!(stamped >= before && stamped <= after);
    }

    #[test]
    fn test_matches_equality() {
        let record =
            Record::from_value(json!({"id": "r1", "status": "draft", "views": 3})).unwrap();

        assert!(record.matches(&json!({"status": "draft"})));
        assert!(record.matches(&json!({"status": "draft", "views": 3})));
        assert!(!record.matches(&json!({"status": "published"})));
        assert!(!record.matches(&json!({"missing": true})));
        // Empty criteria matches everything
        assert!(record.matches(&json!({})));
    }

    #[test]
    fn test_serialize_transparent() {
        let record = Record::from_value(json!({"id": "r1", "name": "Acme"})).unwrap();
        let text = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&text).unwrap();

        assert_eq!(back, record);
        assert!(text.starts_with('{'));
    }
}
