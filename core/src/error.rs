use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::genesis::GenesisLoadError;
use crate::timestamp::TimestampError;

/// Operator-facing failure class, used to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Genesis or prior forge state is missing or unusable.
    Configuration,
    /// The ore or the timestamp override is unusable.
    Input,
    Io,
}

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Genesis(#[from] GenesisLoadError),
    #[error("ore file not found: {}", path.display())]
    OreMissing { path: PathBuf },
    #[error("failed to read ore file {}: {source}", path.display())]
    OreUnreadable { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    #[error("artifact index at {} is unusable: {reason}", path.display())]
    IndexInvalid { path: PathBuf, reason: String },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ForgeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Genesis(_) | Self::IndexInvalid { .. } => ErrorKind::Configuration,
            Self::OreMissing { .. } | Self::OreUnreadable { .. } | Self::Timestamp(_) => {
                ErrorKind::Input
            }
            Self::Write { .. } => ErrorKind::Io,
        }
    }
}
