//! Genesis state access and the deterministic artifact forge.
//!
//! [`mint`] is pure: the same genesis, ore bytes and timestamp always produce
//! byte-identical records. [`Forge`] wraps it with the on-disk layout and
//! write ordering.

#![allow(clippy::missing_errors_doc)]

mod error;
mod forge;
mod genesis;
mod mint;
mod timestamp;

pub use error::{ErrorKind, ForgeError};
pub use forge::{Forge, ForgeOutcome, INDEX_FILE};
pub use genesis::{GENESIS_FILE, GenesisLoadError, GenesisStore, load_genesis_file};
pub use mint::{
    DEFAULT_MESH, LINEAGE_ANCHOR, MINT_HEIGHT, Minted, QUENCH_EVENT, QUENCH_GAS, STRIKE_SEED, mint,
    quench_receipt, strike,
};
pub use timestamp::{TimestampError, parse_timestamp};
