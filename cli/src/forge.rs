use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use vaultmesh_config::Overrides;
use vaultmesh_core::{ErrorKind, Forge, parse_timestamp};

use crate::{fail, settings};

/// Input problems (ore, timestamp) exit with this code; everything else with 1.
const EXIT_INPUT: u8 = 2;

#[derive(Debug, Args)]
pub(crate) struct ForgeArgs {
    /// Ore file to forge.
    ore_file: PathBuf,
    /// Deterministic timestamp: epoch seconds or ISO 8601. Defaults to now.
    #[arg(long)]
    timestamp: Option<String>,
    /// Directory holding genesis.json and the forge outputs.
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

pub(crate) fn run(args: &ForgeArgs) -> Result<ExitCode> {
    let epoch = match args.timestamp.as_deref().map(parse_timestamp).transpose() {
        Ok(epoch) => epoch,
        Err(e) => return Ok(fail(EXIT_INPUT, &e.into())),
    };
    let settings = settings(&Overrides {
        base_dir: args.base_dir.clone(),
        ledger_root: None,
    })?;

    let forge = Forge::new(settings.base_dir);
    match forge.forge_file(&args.ore_file, epoch) {
        Ok(outcome) => {
            println!("FORGED: {}", outcome.artifact_id);
            println!("ORE:    {}", outcome.ore_id);
            println!("STATE:  {}", outcome.state_root);
            println!("ARCH:   {}", outcome.archive_root);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::Input => EXIT_INPUT,
                ErrorKind::Configuration | ErrorKind::Io => 1,
            };
            Ok(fail(code, &e.into()))
        }
    }
}
