//! Forge outputs: artifacts, receipts, checkpoints and the artifact index.
//!
//! Field order in these structs is the field order of the persisted JSON.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ArtifactId, ContentHash, OreId};

/// A deterministic per-validator digest standing in for a consensus signature.
///
/// It proves nothing about the validator's agreement: anyone who knows the ore
/// id and validator id can recompute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulatedAttestation(pub ContentHash);

/// A quorum attestation recorded in a checkpoint.
///
/// Persisted as the bare digest string; there is no real-signature variant in
/// checkpoints yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attestation {
    Simulated(SimulatedAttestation),
}

impl Attestation {
    #[must_use]
    pub fn digest(&self) -> &ContentHash {
        match self {
            Self::Simulated(SimulatedAttestation(hash)) => hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub artifact_id: ArtifactId,
    pub event: String,
    pub gas: u64,
    pub result_hash: ContentHash,
    /// Epoch seconds.
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    pub ore_id: OreId,
    pub product_hash: ContentHash,
    pub lineage_hash: ContentHash,
    pub receipts: Vec<Receipt>,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub height: u64,
    pub state_root: ContentHash,
    pub archive_root: ContentHash,
    pub quorum_signatures: Vec<Attestation>,
}

/// Registry of every artifact minted under a base directory.
///
/// The id set is ordered, so `merkle_root` depends only on which ids are
/// present and never on insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub mesh: String,
    artifacts: BTreeSet<ArtifactId>,
    merkle_root: ContentHash,
    pub created: i64,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(mesh: impl Into<String>, created: i64) -> Self {
        let artifacts = BTreeSet::new();
        let merkle_root = merkle_root(&artifacts);
        Self {
            mesh: mesh.into(),
            artifacts,
            merkle_root,
            created,
        }
    }

    /// Insert `id`. Returns `false` (and changes nothing) if it was present.
    pub fn insert(&mut self, id: ArtifactId) -> bool {
        if !self.artifacts.insert(id) {
            return false;
        }
        self.merkle_root = merkle_root(&self.artifacts);
        true
    }

    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.artifacts.contains(id)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactId> {
        self.artifacts.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    #[must_use]
    pub fn merkle_root(&self) -> &ContentHash {
        &self.merkle_root
    }

    /// True when the stored root matches the id set.
    #[must_use]
    pub fn root_is_consistent(&self) -> bool {
        merkle_root(&self.artifacts) == self.merkle_root
    }
}

/// `sha256(concat(sorted ids))`.
fn merkle_root(ids: &BTreeSet<ArtifactId>) -> ContentHash {
    let parts: Vec<&[u8]> = ids.iter().map(|id| id.as_str().as_bytes()).collect();
    ContentHash::of_parts(&parts)
}
