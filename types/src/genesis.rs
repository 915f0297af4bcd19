//! The governed root state.
//!
//! A [`Genesis`] is identified by the hash of the exact bytes it was loaded
//! from, not by a re-serialization. Two files with the same JSON content but
//! different formatting are different genesis snapshots.

use serde_json::Value;
use thiserror::Error;

use crate::ContentHash;

/// Version reported for a genesis document that does not declare one.
pub const DEFAULT_GENESIS_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("genesis is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("genesis must be a JSON object")]
    NotAnObject,
}

/// One member of the validator roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    pub id: String,
    pub pubkey: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Genesis {
    document: Value,
    hash: ContentHash,
}

impl Genesis {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GenesisError> {
        let document: Value = serde_json::from_slice(bytes)?;
        if !document.is_object() {
            return Err(GenesisError::NotAnObject);
        }
        Ok(Self {
            document,
            hash: ContentHash::of(bytes),
        })
    }

    /// Content hash of the bytes this genesis was parsed from.
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The declared `version`, whatever its JSON type. Only an absent field
    /// falls back to [`DEFAULT_GENESIS_VERSION`].
    #[must_use]
    pub fn version(&self) -> Value {
        self.document
            .get("version")
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_GENESIS_VERSION.to_owned()))
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&str> {
        self.document.get("mesh").and_then(Value::as_str)
    }

    /// Validators in roster order. Entries without a string `id` are skipped.
    #[must_use]
    pub fn validators(&self) -> Vec<Validator> {
        self.document
            .pointer("/consensus/validators")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let id = entry.get("id")?.as_str()?;
                        Some(Validator {
                            id: id.to_owned(),
                            pubkey: entry
                                .get("pubkey")
                                .and_then(Value::as_str)
                                .map(ToOwned::to_owned),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
