use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;
use vaultmesh_config::Overrides;
use vaultmesh_ledger::{AppendOutcome, LedgerError, LedgerEvent, LedgerLog, ShardDay};

use crate::{fail, settings};

const EXIT_MALFORMED: u8 = 2;

#[derive(Debug, Subcommand)]
pub(crate) enum LedgerCommand {
    /// Append one JSON event read from stdin.
    Append {
        /// Ledger root directory.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Print the most recent events of one day shard as JSON lines.
    Tail {
        #[arg(long)]
        root: Option<PathBuf>,
        /// Shard day (YYYY-MM-DD). Defaults to today, UTC.
        #[arg(long)]
        day: Option<ShardDay>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

fn open_log(root: Option<PathBuf>) -> Result<LedgerLog> {
    let settings = settings(&Overrides {
        base_dir: None,
        ledger_root: root,
    })?;
    Ok(LedgerLog::new(settings.ledger_root).with_compact(settings.ledger_compact))
}

pub(crate) fn run(command: LedgerCommand) -> Result<ExitCode> {
    match command {
        LedgerCommand::Append { root } => append(root),
        LedgerCommand::Tail { root, day, limit } => tail(root, day, limit),
    }
}

fn append(root: Option<PathBuf>) -> Result<ExitCode> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read event from stdin")?;

    let event = match LedgerEvent::parse(&raw) {
        Ok(event) => event,
        Err(e) => return Ok(fail(EXIT_MALFORMED, &e.into())),
    };
    let log = open_log(root)?;

    match log.append(event) {
        Ok(ack) => {
            let shard_name = ack
                .shard
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            match ack.outcome {
                AppendOutcome::Duplicate => {
                    eprintln!("[ledger] duplicate event_id; skipping ({shard_name})");
                }
                AppendOutcome::Appended => {
                    eprintln!("[ledger] appended to {}", ack.shard.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ (LedgerError::MalformedEvent { .. } | LedgerError::InvalidTimestamp { .. })) => {
            Ok(fail(EXIT_MALFORMED, &e.into()))
        }
        Err(e) => Err(e.into()),
    }
}

fn tail(root: Option<PathBuf>, day: Option<ShardDay>, limit: usize) -> Result<ExitCode> {
    let log = open_log(root)?;
    let day = day.unwrap_or_else(ShardDay::today);
    for event in log.recent(day, limit)? {
        println!("{}", event.into_value());
    }
    Ok(ExitCode::SUCCESS)
}
