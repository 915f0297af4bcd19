//! Allow/deny path policy over JSON pointers.
//!
//! A pattern matches a path when every pattern segment matches the
//! corresponding leading path segment; `*` matches any one segment. Denied
//! patterns win over allowed ones.

use std::fmt;

use crate::patch::parse_pointer;
use crate::proposal::ChangeSet;

pub const DEFAULT_ALLOWED: &[&str] = &[
    "/consensus/validators",
    "/consensus/quorum",
    "/parameters",
    "/ledger",
];

/// Audit history and validator identity are never writable by proposal.
pub const DEFAULT_DENIED: &[&str] = &[
    "/genesis_time",
    "/history",
    "/archive",
    "/receipts",
    "/checkpoints",
    "/artifact_index",
    "/consensus/validators/*/id",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<String>,
}

impl PathPattern {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            segments: split_segments(raw),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &[String]) -> bool {
        self.segments.len() <= path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(pattern, segment)| pattern == "*" || pattern == segment)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_segments(raw: &str) -> Vec<String> {
    raw.split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    allowed: Vec<PathPattern>,
    denied: Vec<PathPattern>,
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED, DEFAULT_DENIED)
    }
}

impl PathPolicy {
    #[must_use]
    pub fn new(allowed: &[&str], denied: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|p| PathPattern::new(p)).collect(),
            denied: denied.iter().map(|p| PathPattern::new(p)).collect(),
        }
    }

    /// Check one pointer. `Err` carries the reason.
    pub fn check_pointer(&self, pointer: &str) -> Result<(), String> {
        if pointer.is_empty() {
            return Err("empty path would replace the whole genesis".to_owned());
        }
        let segments = parse_pointer(pointer).map_err(|e| e.to_string())?;
        self.check_segments(pointer, &segments)
    }

    fn check_segments(&self, display: &str, segments: &[String]) -> Result<(), String> {
        if let Some(rule) = self.denied.iter().find(|p| p.matches(segments)) {
            return Err(format!("path {display} is denied by {rule}"));
        }
        if self.allowed.iter().any(|p| p.matches(segments)) {
            Ok(())
        } else {
            Err(format!("path {display} is outside the allowed prefixes"))
        }
    }

    /// Every violation in `changes`. Empty means the change set is allowed.
    #[must_use]
    pub fn violations(&self, changes: &ChangeSet) -> Vec<String> {
        match changes {
            ChangeSet::JsonPatch(ops) => {
                let mut reasons = Vec::new();
                for (i, op) in ops.iter().enumerate() {
                    let Some(path) = op.get("path").and_then(serde_json::Value::as_str) else {
                        reasons.push(format!("json_patch[{i}] has no path"));
                        continue;
                    };
                    let mut affected = vec![path];
                    if let Some(from) = op.get("from").and_then(serde_json::Value::as_str) {
                        let op_name = op.get("op").and_then(serde_json::Value::as_str);
                        if matches!(op_name, Some("move" | "copy")) {
                            affected.push(from);
                        }
                    }
                    for pointer in affected {
                        if let Err(reason) = self.check_pointer(pointer) {
                            reasons.push(format!("json_patch[{i}]: {reason}"));
                        }
                    }
                }
                reasons
            }
            ChangeSet::MergePatch(patch) => patch
                .keys()
                .filter_map(|key| {
                    self.check_segments(&format!("/{key}"), std::slice::from_ref(key))
                        .err()
                        .map(|reason| format!("merge_patch: {reason}"))
                })
                .collect(),
            ChangeSet::Unsupported(reason) => vec![reason.clone()],
        }
    }
}
