//! Governance proposal verification.
//!
//! A proposal names the genesis it was built against, carries a change set
//! (JSON patch or merge patch) and a list of guardian signatures. The
//! [`Verifier`] never mutates anything: it checks the base lock and path
//! policy, dry-runs the patch on a copy of genesis, and counts signatures over
//! the proposal's canonical challenge.

#![allow(clippy::missing_errors_doc)]

mod patch;
mod policy;
mod proposal;
mod signature;
mod template;
mod verifier;

pub use patch::{PatchError, apply_json_patch, apply_merge_patch, parse_pointer};
pub use policy::{DEFAULT_ALLOWED, DEFAULT_DENIED, PathPattern, PathPolicy};
pub use proposal::{ChangeSet, Proposal, SignatureEntry, UNSIGNED_FIELDS};
#[cfg(feature = "ed25519")]
pub use signature::Ed25519Verifier;
pub use signature::{
    SignatureError, SignatureVerifier, Tally, default_signature_verifier, tally_signatures,
};
pub use template::{
    InvalidSemVer, SemVer, TEMPLATE_ORE_TYPE, TemplateProposalError, verify_template_evolution,
};
pub use verifier::{VerificationReport, Verifier};
