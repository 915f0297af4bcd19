use std::fmt;

use crate::ContentHash;

/// Domain-separation tag mixed into every product hash.
///
/// Changing the minting rule means bumping this tag (`|hammer-v2|`), never
/// reusing it for different semantics.
pub const HAMMER_TAG: &[u8] = b"|hammer-v1|";

/// Number of hex characters kept in short identifiers.
pub const SHORT_ID_LEN: usize = 16;

/// Identifier of a raw input: `ore-` + the first 16 hex chars of `sha256(ore)`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct OreId(String);

impl OreId {
    #[must_use]
    pub fn derive(ore_bytes: &[u8]) -> Self {
        let hash = ContentHash::of(ore_bytes);
        Self(format!("ore-{}", hash.prefix(SHORT_ID_LEN)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a minted artifact: `artifact-` + the first 16 hex chars of
/// the product hash.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    #[must_use]
    pub fn from_product_hash(product_hash: &ContentHash) -> Self {
        Self(format!("artifact-{}", product_hash.prefix(SHORT_ID_LEN)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `sha256(ore ‖ HAMMER_TAG)`.
#[must_use]
pub fn product_hash(ore_bytes: &[u8]) -> ContentHash {
    ContentHash::of_parts(&[ore_bytes, HAMMER_TAG])
}
