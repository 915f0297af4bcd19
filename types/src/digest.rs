//! SHA-256 content hashes.
//!
//! Every identifier and root in VaultMesh is a lowercase hex SHA-256 digest.
//! [`ContentHash`] is the only way to produce one, so a value of this type is
//! always 64 hex characters.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Lowercase hex SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

#[derive(Debug, Error)]
#[error("not a sha256 hex digest: {0:?}")]
pub struct InvalidContentHash(pub String);

impl ContentHash {
    pub const HEX_LEN: usize = 64;

    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self::of_parts(&[bytes])
    }

    /// Hash of the concatenation of `parts`, without separators.
    #[must_use]
    pub fn of_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidContentHash> {
        let valid = raw.len() == Self::HEX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(InvalidContentHash(raw.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex characters (clamped to the digest length).
    #[must_use]
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(Self::HEX_LEN)]
    }

    /// The 32 raw digest bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        // Construction guarantees 64 valid hex chars.
        if hex::decode_to_slice(&self.0, &mut out).is_err() {
            unreachable!("ContentHash always holds 64 hex characters");
        }
        out
    }
}

impl TryFrom<String> for ContentHash {
    type Error = InvalidContentHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
