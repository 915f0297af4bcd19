//! Core domain types for VaultMesh.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! content hashes and canonical JSON, ore/artifact identifiers, the genesis
//! document, and the forge's persisted records.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod artifact;
mod canonical;
mod digest;
mod genesis;
mod ids;

pub use artifact::{
    Artifact, ArtifactIndex, Attestation, Checkpoint, Receipt, SimulatedAttestation,
};
pub use canonical::{canonical_hash, canonical_json};
pub use digest::{ContentHash, InvalidContentHash};
pub use genesis::{DEFAULT_GENESIS_VERSION, Genesis, GenesisError, Validator};
pub use ids::{ArtifactId, HAMMER_TAG, OreId, SHORT_ID_LEN, product_hash};
