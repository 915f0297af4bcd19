//! Proposal shape and the signing challenge.

use serde::Deserialize;
use serde_json::{Map, Value};
use vaultmesh_types::{ContentHash, canonical_hash};

/// Fields excluded from the signed challenge.
pub const UNSIGNED_FIELDS: &[&str] = &["signatures", "acceptance"];

/// A governance proposal as submitted. Unknown fields are kept, since they
/// are part of what guardians sign.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    document: Value,
}

/// The requested change, in one of the two supported encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSet {
    /// RFC 6902 operation sequence.
    JsonPatch(Vec<Value>),
    /// Merge-patch object; only its top-level keys are policy-checked.
    MergePatch(Map<String, Value>),
    Unsupported(String),
}

/// One submitted guardian signature. Missing fields are simply not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignatureEntry {
    #[serde(default)]
    pub guardian_id: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Proposal {
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.document.is_object()
    }

    /// Canonical hash of the proposal without its signatures and acceptance.
    #[must_use]
    pub fn challenge(&self) -> ContentHash {
        match &self.document {
            Value::Object(fields) => {
                let core: Map<String, Value> = fields
                    .iter()
                    .filter(|(key, _)| !UNSIGNED_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                canonical_hash(&Value::Object(core))
            }
            other => canonical_hash(other),
        }
    }

    #[must_use]
    pub fn base_genesis_hash(&self) -> Option<&str> {
        self.document.get("base_genesis_hash").and_then(Value::as_str)
    }

    #[must_use]
    pub fn base_genesis_version(&self) -> Option<&Value> {
        self.document.get("base_genesis_version")
    }

    /// `changes.json_patch` wins over `changes.merge_patch` when both are present.
    #[must_use]
    pub fn change_set(&self) -> ChangeSet {
        let Some(changes) = self.document.get("changes").and_then(Value::as_object) else {
            return ChangeSet::Unsupported(
                "changes must be an object with json_patch or merge_patch".to_owned(),
            );
        };
        if let Some(ops) = changes.get("json_patch") {
            return match ops {
                Value::Array(ops) => ChangeSet::JsonPatch(ops.clone()),
                _ => ChangeSet::Unsupported("changes.json_patch must be an array".to_owned()),
            };
        }
        if let Some(patch) = changes.get("merge_patch") {
            return match patch {
                Value::Object(patch) => ChangeSet::MergePatch(patch.clone()),
                _ => ChangeSet::Unsupported("changes.merge_patch must be an object".to_owned()),
            };
        }
        ChangeSet::Unsupported("unsupported change set (expected json_patch or merge_patch)".to_owned())
    }

    /// Submitted signatures. Entries that are not objects are dropped.
    #[must_use]
    pub fn signatures(&self) -> Vec<SignatureEntry> {
        self.document
            .get("signatures")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.is_object())
                    .map(|entry| SignatureEntry::deserialize(entry).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }
}
