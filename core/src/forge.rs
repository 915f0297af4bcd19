//! Forge persistence around the pure [`mint`](crate::mint::mint).
//!
//! Layout under the base directory:
//!
//! ```text
//! genesis.json
//! archive/<artifact_id>.json
//! receipts/<artifact_id>_receipt.json
//! checkpoints/checkpoint_0001.json
//! artifact_index.json
//! ```
//!
//! Files are written archive → receipt → checkpoint → index. The index is
//! written last, so it never names an artifact whose file is missing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use vaultmesh_types::{ArtifactId, ArtifactIndex, ContentHash, OreId};
use vaultmesh_utils::{recover_bak_file, write_json_pretty};

use crate::error::ForgeError;
use crate::genesis::GenesisStore;
use crate::mint::{Minted, mint};

pub const INDEX_FILE: &str = "artifact_index.json";

/// Everything the operator needs to know about one forge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeOutcome {
    pub artifact_id: ArtifactId,
    pub ore_id: OreId,
    pub state_root: ContentHash,
    pub archive_root: ContentHash,
    /// `false` when the index already listed this artifact.
    pub newly_indexed: bool,
    /// Written files, in write order.
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Forge {
    base_dir: PathBuf,
    genesis: GenesisStore,
}

impl Forge {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            genesis: GenesisStore::new(&base_dir),
            base_dir,
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn archive_path(&self, id: &ArtifactId) -> PathBuf {
        self.base_dir.join("archive").join(format!("{id}.json"))
    }

    #[must_use]
    pub fn receipt_path(&self, id: &ArtifactId) -> PathBuf {
        self.base_dir
            .join("receipts")
            .join(format!("{id}_receipt.json"))
    }

    #[must_use]
    pub fn checkpoint_path(&self, height: u64) -> PathBuf {
        self.base_dir
            .join("checkpoints")
            .join(format!("checkpoint_{height:04}.json"))
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join(INDEX_FILE)
    }

    /// Forge the ore at `ore_path`.
    ///
    /// `epoch` is the deterministic timestamp; `None` reads the wall clock.
    pub fn forge_file(
        &self,
        ore_path: &Path,
        epoch: Option<i64>,
    ) -> Result<ForgeOutcome, ForgeError> {
        let genesis = self.genesis.load()?;
        let ore = read_ore(ore_path)?;
        let prior_index = self.load_index()?;
        let epoch = epoch.unwrap_or_else(|| chrono::Utc::now().timestamp());

        let minted = mint(&genesis, &ore, epoch, prior_index);
        let written = self.persist(&minted)?;

        tracing::info!(
            artifact_id = %minted.artifact.artifact_id,
            ore_id = %minted.artifact.ore_id,
            validators = minted.checkpoint.quorum_signatures.len(),
            newly_indexed = minted.newly_indexed,
            "Forged artifact"
        );

        let Minted {
            artifact,
            checkpoint,
            newly_indexed,
            ..
        } = minted;
        Ok(ForgeOutcome {
            artifact_id: artifact.artifact_id,
            ore_id: artifact.ore_id,
            state_root: checkpoint.state_root,
            archive_root: checkpoint.archive_root,
            newly_indexed,
            written,
        })
    }

    /// Load the existing index, if any.
    ///
    /// An index that does not parse, or whose root disagrees with its id set,
    /// is refused rather than overwritten.
    pub fn load_index(&self) -> Result<Option<ArtifactIndex>, ForgeError> {
        let path = self.index_path();
        recover_bak_file(&path);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ForgeError::IndexInvalid {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        let index: ArtifactIndex =
            serde_json::from_slice(&bytes).map_err(|e| ForgeError::IndexInvalid {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if !index.root_is_consistent() {
            return Err(ForgeError::IndexInvalid {
                path,
                reason: "merkle_root does not match the artifact set".to_owned(),
            });
        }
        tracing::debug!(path = %path.display(), artifacts = index.len(), "Loaded artifact index");
        Ok(Some(index))
    }

    fn persist(&self, minted: &Minted) -> Result<Vec<PathBuf>, ForgeError> {
        let id = &minted.artifact.artifact_id;
        let archive = self.archive_path(id);
        write_record(&archive, &minted.artifact)?;
        let receipt = self.receipt_path(id);
        write_record(&receipt, &minted.receipt)?;
        let checkpoint = self.checkpoint_path(minted.checkpoint.height);
        write_record(&checkpoint, &minted.checkpoint)?;
        let index = self.index_path();
        write_record(&index, &minted.index)?;
        Ok(vec![archive, receipt, checkpoint, index])
    }
}

fn read_ore(path: &Path) -> Result<Vec<u8>, ForgeError> {
    fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ForgeError::OreMissing {
                path: path.to_path_buf(),
            }
        } else {
            ForgeError::OreUnreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn write_record<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ForgeError> {
    write_json_pretty(path, value).map_err(|source| ForgeError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Wrote forge record");
    Ok(())
}
