//! VaultMesh CLI - forge artifacts, append ledger events, verify governance proposals.
//!
//! ```text
//! vaultmesh forge <ORE> [--timestamp TS] [--base-dir DIR]
//! vaultmesh ledger append [--root DIR]          < event.json
//! vaultmesh ledger tail [--root DIR] [--day YYYY-MM-DD] [--limit N]
//! vaultmesh governance verify --proposal P --genesis G
//! vaultmesh governance template-verify --proposal P [--repo-root DIR]
//! ```
//!
//! Machine-readable output goes to stdout. Status lines, diagnostics and logs
//! go to stderr.

mod forge;
mod governance;
mod ledger;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vaultmesh_config::{Overrides, Settings, VaultmeshConfig};

#[derive(Debug, Parser)]
#[command(name = "vaultmesh", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forge an ore file into an artifact, receipt, checkpoint and index entry.
    Forge(forge::ForgeArgs),
    /// Append to or read the day-sharded event ledger.
    #[command(subcommand)]
    Ledger(ledger::LedgerCommand),
    /// Verify governance proposals against a genesis snapshot.
    #[command(subcommand)]
    Governance(governance::GovernanceCommand),
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Resolve settings from flags, environment and the config file.
pub(crate) fn settings(overrides: &Overrides) -> Result<Settings> {
    let config = VaultmeshConfig::load().context("failed to load configuration")?;
    let settings = Settings::resolve(config.as_ref(), overrides);
    tracing::debug!(
        base_dir = %settings.base_dir.display(),
        ledger_root = %settings.ledger_root.display(),
        compact = settings.ledger_compact,
        "resolved settings"
    );
    Ok(settings)
}

/// Print `err` as an operator diagnostic and exit with `code`.
pub(crate) fn fail(code: u8, err: &anyhow::Error) -> ExitCode {
    eprintln!("error: {err:#}");
    ExitCode::from(code)
}

pub(crate) fn read_to_string(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Command::Forge(args) => forge::run(&args),
        Command::Ledger(command) => ledger::run(command),
        Command::Governance(command) => governance::run(command),
    };
    result.unwrap_or_else(|err| fail(1, &err))
}
