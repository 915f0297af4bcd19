//! The governance verifier: one exhaustive report per proposal.

use serde::Serialize;
use serde_json::Value;
use vaultmesh_types::{ContentHash, Genesis, canonical_hash};

use crate::patch::{apply_json_patch, apply_merge_patch};
use crate::policy::PathPolicy;
use crate::proposal::{ChangeSet, Proposal};
use crate::signature::{SignatureVerifier, default_signature_verifier, tally_signatures};

/// Outcome of [`Verifier::verify`]. Every field is computed regardless of
/// earlier failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub challenge_hex: ContentHash,
    pub base_genesis_hash: ContentHash,
    /// The genesis `version` exactly as declared, not necessarily a string.
    pub base_genesis_version: Value,
    pub base_lock_ok: bool,
    pub paths_ok: bool,
    pub apply_ok: bool,
    pub new_genesis_hash: Option<ContentHash>,
    pub signatures_ok: usize,
    pub signatures_total: usize,
    pub signature_verification_supported: bool,
    /// Human-readable reasons for every failed check.
    pub reasons: Vec<String>,
}

impl VerificationReport {
    /// Base lock, path policy and dry-run apply all hold.
    ///
    /// Signature sufficiency is left to the caller.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.base_lock_ok && self.paths_ok && self.apply_ok
    }
}

pub struct Verifier {
    policy: PathPolicy,
    signatures: Option<Box<dyn SignatureVerifier>>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("policy", &self.policy)
            .field("signatures_supported", &self.signatures.is_some())
            .finish()
    }
}

impl Verifier {
    /// Default path policy and the build's signature capability.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: PathPolicy::default(),
            signatures: default_signature_verifier(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_signature_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.signatures = Some(verifier);
        self
    }

    #[must_use]
    pub fn without_signature_verification(mut self) -> Self {
        self.signatures = None;
        self
    }

    #[must_use]
    pub fn verify(&self, proposal: &Proposal, genesis: &Genesis) -> VerificationReport {
        let mut reasons = Vec::new();
        if !proposal.is_object() {
            reasons.push("proposal must be a JSON object".to_owned());
        }

        let challenge = proposal.challenge();

        let base_lock_ok = check_base_lock(proposal, genesis, &mut reasons);

        let changes = proposal.change_set();
        let violations = self.policy.violations(&changes);
        let paths_ok = violations.is_empty();
        reasons.extend(violations);

        let applied = match &changes {
            ChangeSet::JsonPatch(ops) => apply_json_patch(genesis.document(), ops)
                .map_err(|e| format!("dry-run apply failed: {e}")),
            ChangeSet::MergePatch(patch) => Ok(apply_merge_patch(genesis.document(), patch)),
            ChangeSet::Unsupported(_) => Err("dry-run apply skipped: no usable change set".to_owned()),
        };
        let new_genesis_hash = match applied {
            Ok(doc) => Some(canonical_hash(&doc)),
            Err(reason) => {
                reasons.push(reason);
                None
            }
        };

        let tally = tally_signatures(
            &proposal.signatures(),
            &genesis.validators(),
            &challenge,
            self.signatures.as_deref(),
        );

        let report = VerificationReport {
            challenge_hex: challenge,
            base_genesis_hash: genesis.hash().clone(),
            base_genesis_version: genesis.version(),
            base_lock_ok,
            paths_ok,
            apply_ok: new_genesis_hash.is_some(),
            new_genesis_hash,
            signatures_ok: tally.valid,
            signatures_total: tally.total,
            signature_verification_supported: tally.supported,
            reasons,
        };
        tracing::info!(
            challenge = %report.challenge_hex,
            accepted = report.accepted(),
            signatures_ok = report.signatures_ok,
            signatures_total = report.signatures_total,
            "Verified proposal"
        );
        report
    }
}

fn check_base_lock(proposal: &Proposal, genesis: &Genesis, reasons: &mut Vec<String>) -> bool {
    let mut ok = true;
    if proposal.base_genesis_hash() != Some(genesis.hash().as_str()) {
        reasons.push(format!(
            "base_genesis_hash {:?} does not match genesis {}",
            proposal.base_genesis_hash().unwrap_or(""),
            genesis.hash()
        ));
        ok = false;
    }
    let version = genesis.version();
    if proposal.base_genesis_version() != Some(&version) {
        reasons.push(format!(
            "base_genesis_version {} does not match genesis {version}",
            proposal
                .base_genesis_version()
                .map_or_else(|| "(missing)".to_owned(), ToString::to_string),
        ));
        ok = false;
    }
    ok
}
