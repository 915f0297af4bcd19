//! Configuration for the VaultMesh command surface.
//!
//! Settings come from four layers, highest precedence first:
//!
//! 1. explicit command-line values
//! 2. environment (`VAULTMESH_BASE_DIR`, `VAULTMESH_LEDGER_ROOT`, `VAULTMESH_LEDGER_COMPACT`)
//! 3. `config.toml` (`$VAULTMESH_CONFIG`, else `~/.vaultmesh/config.toml`)
//! 4. built-in defaults
//!
//! ```toml
//! [forge]
//! base_dir = "${HOME}/unforged_forge_genesis"
//!
//! [ledger]
//! root = "/var/lib/vaultmesh/ledger"
//! compact = true
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "VAULTMESH_CONFIG";
pub const BASE_DIR_ENV: &str = "VAULTMESH_BASE_DIR";
pub const LEDGER_ROOT_ENV: &str = "VAULTMESH_LEDGER_ROOT";
/// Set to `1` to enable ledger compact mode.
pub const LEDGER_COMPACT_ENV: &str = "VAULTMESH_LEDGER_COMPACT";

const DEFAULT_LEDGER_DIR: &str = "ledger";

#[derive(Debug, Default, Deserialize)]
pub struct VaultmeshConfig {
    pub forge: Option<ForgeSection>,
    pub ledger: Option<LedgerSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgeSection {
    /// Directory holding `genesis.json` and the forge outputs.
    pub base_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerSection {
    /// Directory holding the day shards.
    pub root: Option<String>,
    /// Strip events down to the compact allow-list before writing.
    #[serde(default)]
    pub compact: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl VaultmeshConfig {
    /// Load the config file, if one exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load `path`. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// `$VAULTMESH_CONFIG`, else `~/.vaultmesh/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_ENV)
        && !explicit.trim().is_empty()
    {
        return Some(PathBuf::from(explicit));
    }
    dirs::home_dir().map(|home| home.join(".vaultmesh").join("config.toml"))
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub ledger_root: PathBuf,
    pub ledger_compact: bool,
}

/// Values given explicitly on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub ledger_root: Option<PathBuf>,
}

impl Settings {
    /// Resolve against the process environment.
    #[must_use]
    pub fn resolve(config: Option<&VaultmeshConfig>, overrides: &Overrides) -> Self {
        Self::resolve_with(config, overrides, |key| env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    #[must_use]
    pub fn resolve_with(
        config: Option<&VaultmeshConfig>,
        overrides: &Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_path = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        let forge = config.and_then(|c| c.forge.as_ref());
        let ledger = config.and_then(|c| c.ledger.as_ref());

        let base_dir = overrides
            .base_dir
            .clone()
            .or_else(|| env_path(BASE_DIR_ENV))
            .or_else(|| {
                forge
                    .and_then(|f| f.base_dir.as_deref())
                    .map(|raw| PathBuf::from(expand_env_vars(raw, &lookup)))
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let ledger_root = overrides
            .ledger_root
            .clone()
            .or_else(|| env_path(LEDGER_ROOT_ENV))
            .or_else(|| {
                ledger
                    .and_then(|l| l.root.as_deref())
                    .map(|raw| PathBuf::from(expand_env_vars(raw, &lookup)))
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_DIR));

        let ledger_compact = match lookup(LEDGER_COMPACT_ENV) {
            Some(value) => value.trim() == "1",
            None => ledger.is_some_and(|l| l.compact),
        };

        Self {
            base_dir,
            ledger_root,
            ledger_compact,
        }
    }
}

/// Replace `${VAR}` references. Unknown variables become empty.
pub fn expand_env_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
