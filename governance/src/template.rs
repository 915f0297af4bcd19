//! Template evolution proposals: forward-only semver bumps of repo templates.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

pub const TEMPLATE_ORE_TYPE: &str = "template_evolution.v1";

/// The proposal itself is unusable; no target was checked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateProposalError {
    #[error("ore_type must be '{TEMPLATE_ORE_TYPE}'")]
    WrongOreType,
    #[error("targets[] is required and non-empty")]
    NoTargets,
}

/// Strict `MAJOR.MINOR.PATCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid semver: {0}")]
pub struct InvalidSemVer(pub String);

impl FromStr for SemVer {
    type Err = InvalidSemVer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSemVer(s.to_owned());
        let mut parts = s.split('.').map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        });
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Ok(Self {
            major: major?,
            minor: minor?,
            patch: patch?,
        })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Check every target against the templates under `repo_root`.
///
/// Returns the problems found, one per failing target; empty means the
/// proposal is valid.
pub fn verify_template_evolution(
    proposal: &Value,
    repo_root: &Path,
) -> Result<Vec<String>, TemplateProposalError> {
    if proposal.get("ore_type").and_then(Value::as_str) != Some(TEMPLATE_ORE_TYPE) {
        return Err(TemplateProposalError::WrongOreType);
    }
    let targets = proposal
        .get("targets")
        .and_then(Value::as_array)
        .filter(|targets| !targets.is_empty())
        .ok_or(TemplateProposalError::NoTargets)?;

    let errors: Vec<String> = targets
        .iter()
        .filter_map(|target| check_target(target, repo_root).err())
        .collect();
    tracing::debug!(targets = targets.len(), errors = errors.len(), "Checked template evolution");
    Ok(errors)
}

fn check_target(target: &Value, repo_root: &Path) -> Result<(), String> {
    let field = |name: &str| {
        target
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    };
    let (Some(path), Some(from), Some(to)) =
        (field("template_path"), field("from_version"), field("to_version"))
    else {
        return Err(format!("target missing fields: {target}"));
    };

    let (Ok(from_ver), Ok(to_ver)) = (from.parse::<SemVer>(), to.parse::<SemVer>()) else {
        return Err(format!("invalid semver(s): from={from} to={to} for {path}"));
    };
    if to_ver <= from_ver {
        return Err(format!(
            "to_version must be greater than from_version for {path}: {from} -> {to}"
        ));
    }

    let template = repo_root.join(path);
    if !template.exists() {
        return Err(format!("template not found: {}", template.display()));
    }
    let current = read_version_line(&template)?;
    if current != from {
        return Err(format!(
            "version mismatch in {}: repo has {current}, proposal expects {from}",
            template.display()
        ));
    }
    Ok(())
}

/// Value of the first `version:` line, with surrounding quotes stripped.
fn read_version_line(path: &Path) -> Result<String, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed reading {}: {e}", path.display()))?;
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("version:"))
        .map(|value| value.trim().trim_matches(|c| c == '\'' || c == '"').to_owned())
        .ok_or_else(|| format!("no 'version:' key found in {}", path.display()))
}
