//! Pure minting: ore + genesis + timestamp → artifact, receipt, checkpoint, index.
//!
//! Nothing here reads the clock, the filesystem, or any randomness. Given the
//! same inputs, [`mint`] returns byte-identical records.

use vaultmesh_types::{
    Artifact, ArtifactId, ArtifactIndex, Attestation, Checkpoint, ContentHash, Genesis, OreId,
    Receipt, SimulatedAttestation, product_hash,
};

/// Root-of-trust anchor shared by every artifact of this system version.
pub const LINEAGE_ANCHOR: &[u8] = b"genesis-lineage";
pub const QUENCH_EVENT: &str = "quench";
pub const QUENCH_GAS: u64 = 271_828;
/// Fixed seed mixed into every simulated strike.
pub const STRIKE_SEED: &str = "seed-alpha";
pub const DEFAULT_MESH: &str = "Unforged-Forge";
/// The forge mints exactly one checkpoint, at this height.
pub const MINT_HEIGHT: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minted {
    pub artifact: Artifact,
    pub receipt: Receipt,
    pub checkpoint: Checkpoint,
    pub index: ArtifactIndex,
    /// `false` when the artifact was already indexed.
    pub newly_indexed: bool,
}

pub fn mint(
    genesis: &Genesis,
    ore_bytes: &[u8],
    epoch: i64,
    prior_index: Option<ArtifactIndex>,
) -> Minted {
    let ore_id = OreId::derive(ore_bytes);
    let product_hash = product_hash(ore_bytes);
    let artifact_id = ArtifactId::from_product_hash(&product_hash);
    let lineage_hash = ContentHash::of(LINEAGE_ANCHOR);

    let receipt = quench_receipt(&artifact_id, epoch);

    let quorum_signatures = genesis
        .validators()
        .iter()
        .map(|validator| Attestation::Simulated(strike(&ore_id, &validator.id)))
        .collect();

    let checkpoint = Checkpoint {
        height: MINT_HEIGHT,
        state_root: ContentHash::of_parts(&[
            product_hash.as_str().as_bytes(),
            lineage_hash.as_str().as_bytes(),
        ]),
        archive_root: ContentHash::of_parts(&[
            artifact_id.as_str().as_bytes(),
            receipt.result_hash.as_str().as_bytes(),
        ]),
        quorum_signatures,
    };

    let mut index = prior_index.unwrap_or_else(|| {
        ArtifactIndex::new(genesis.mesh().unwrap_or(DEFAULT_MESH), epoch)
    });
    let newly_indexed = index.insert(artifact_id.clone());

    let artifact = Artifact {
        artifact_id,
        ore_id,
        product_hash,
        lineage_hash,
        receipts: vec![receipt.clone()],
        height: MINT_HEIGHT,
    };

    Minted {
        artifact,
        receipt,
        checkpoint,
        index,
        newly_indexed,
    }
}

/// Simulated per-validator strike: `sha256("{ore_id}|strike|{validator}|seed-alpha")`.
#[must_use]
pub fn strike(ore_id: &OreId, validator_id: &str) -> SimulatedAttestation {
    let preimage = format!("{ore_id}|strike|{validator_id}|{STRIKE_SEED}");
    SimulatedAttestation(ContentHash::of(preimage.as_bytes()))
}

#[must_use]
pub fn quench_receipt(artifact_id: &ArtifactId, epoch: i64) -> Receipt {
    let preimage = format!("{artifact_id}|{QUENCH_EVENT}|{epoch}");
    Receipt {
        artifact_id: artifact_id.clone(),
        event: QUENCH_EVENT.to_owned(),
        gas: QUENCH_GAS,
        result_hash: ContentHash::of(preimage.as_bytes()),
        time: epoch,
    }
}
