use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid json: {reason}")]
    MalformedEvent { reason: String },
    #[error("unusable event timestamp {ts:?}")]
    InvalidTimestamp { ts: String },
    #[error("ledger io on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
