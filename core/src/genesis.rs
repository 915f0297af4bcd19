//! Read-only access to the governed genesis state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vaultmesh_types::{Genesis, GenesisError};

pub const GENESIS_FILE: &str = "genesis.json";

#[derive(Debug, Error)]
pub enum GenesisLoadError {
    #[error(
        "genesis.json not found at {} (use --base-dir to point at the forge root)",
        path.display()
    )]
    Missing { path: PathBuf },
    #[error("failed to read genesis at {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("invalid genesis at {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: GenesisError,
    },
}

/// Locates and loads `genesis.json` under a base directory.
#[derive(Debug, Clone)]
pub struct GenesisStore {
    base_dir: PathBuf,
}

impl GenesisStore {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(GENESIS_FILE)
    }

    pub fn load(&self) -> Result<Genesis, GenesisLoadError> {
        load_genesis_file(&self.path())
    }
}

/// Load a genesis document from an explicit path.
pub fn load_genesis_file(path: &Path) -> Result<Genesis, GenesisLoadError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(GenesisLoadError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(GenesisLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let genesis = Genesis::from_bytes(&bytes).map_err(|source| GenesisLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        hash = %genesis.hash(),
        version = %genesis.version(),
        "Loaded genesis"
    );
    Ok(genesis)
}
