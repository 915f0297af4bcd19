//! Canonical JSON serialization.
//!
//! Object keys are sorted recursively and no incidental whitespace is emitted,
//! so two documents that differ only in key order or formatting produce the
//! same bytes and therefore the same [`ContentHash`].

use serde_json::{Map, Value};

use crate::ContentHash;

/// Canonical bytes for `value`.
#[must_use]
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let sorted = sort_keys(value);
    // Serializing a `Value` into memory only fails for non-string map keys,
    // which `Value` cannot represent.
    serde_json::to_vec(&sorted).unwrap_or_default()
}

#[must_use]
pub fn canonical_hash(value: &Value) -> ContentHash {
    ContentHash::of(&canonical_json(value))
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), sort_keys(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
