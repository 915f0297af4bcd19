use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;
use vaultmesh_core::load_genesis_file;
use vaultmesh_governance::{Proposal, Verifier, verify_template_evolution};

use crate::{fail, read_to_string};

const EXIT_REJECTED: u8 = 2;
const EXIT_TARGET_ERRORS: u8 = 1;
const EXIT_MALFORMED_PROPOSAL: u8 = 2;

#[derive(Debug, Subcommand)]
pub(crate) enum GovernanceCommand {
    /// Verify a proposal against a genesis file and print the JSON report.
    Verify {
        #[arg(long)]
        proposal: PathBuf,
        #[arg(long)]
        genesis: PathBuf,
    },
    /// Verify a template evolution proposal against a repository checkout.
    TemplateVerify {
        #[arg(long)]
        proposal: PathBuf,
        #[arg(long, default_value = ".")]
        repo_root: PathBuf,
    },
}

pub(crate) fn run(command: GovernanceCommand) -> Result<ExitCode> {
    match command {
        GovernanceCommand::Verify { proposal, genesis } => verify(&proposal, &genesis),
        GovernanceCommand::TemplateVerify {
            proposal,
            repo_root,
        } => template_verify(&proposal, &repo_root),
    }
}

fn verify(proposal_path: &Path, genesis_path: &Path) -> Result<ExitCode> {
    let raw = read_to_string(proposal_path, "proposal")?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid proposal JSON in {}", proposal_path.display()))?;
    let genesis = load_genesis_file(genesis_path)?;

    let report = Verifier::new().verify(&Proposal::new(document), &genesis);
    println!("{}", serde_json::to_string_pretty(&report)?);

    for reason in &report.reasons {
        eprintln!(" - {reason}");
    }
    if report.accepted() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_REJECTED))
    }
}

fn template_verify(proposal_path: &Path, repo_root: &Path) -> Result<ExitCode> {
    let raw = read_to_string(proposal_path, "proposal")?;
    let document: Value = match serde_json::from_str(&raw) {
        Ok(document) => document,
        Err(e) => {
            let err = anyhow::Error::new(e)
                .context(format!("invalid proposal JSON in {}", proposal_path.display()));
            return Ok(fail(EXIT_MALFORMED_PROPOSAL, &err));
        }
    };

    let errors = match verify_template_evolution(&document, repo_root) {
        Ok(errors) => errors,
        Err(e) => return Ok(fail(EXIT_MALFORMED_PROPOSAL, &e.into())),
    };
    if errors.is_empty() {
        println!("[verify] OK - all targets valid and forward-semver");
        return Ok(ExitCode::SUCCESS);
    }
    println!("[verify] FAIL");
    for err in &errors {
        eprintln!(" - {err}");
    }
    Ok(ExitCode::from(EXIT_TARGET_ERRORS))
}
