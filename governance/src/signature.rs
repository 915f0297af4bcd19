//! Quorum signature capability and tally.
//!
//! Signature checking is pluggable: the verifier only sees a
//! [`SignatureVerifier`]. Without one, the tally reports that verification is
//! unsupported instead of guessing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use vaultmesh_types::{ContentHash, Validator};

use crate::proposal::SignatureEntry;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("{field} is not valid base64")]
    Encoding { field: &'static str },
    #[error("public key is not a valid key")]
    InvalidKey,
    #[error("signature is malformed")]
    Malformed,
    #[error("signature does not verify")]
    Mismatch,
}

/// Verifies one base64 signature by one base64 public key.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        public_key_b64: &str,
        signature_b64: &str,
        message: &[u8],
    ) -> Result<(), SignatureError>;
}

/// Strict Ed25519 over the raw message bytes.
#[cfg(feature = "ed25519")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

#[cfg(feature = "ed25519")]
impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        public_key_b64: &str,
        signature_b64: &str,
        message: &[u8],
    ) -> Result<(), SignatureError> {
        use ed25519_dalek::{Signature, VerifyingKey};

        let key_bytes: [u8; 32] = decode_b64(public_key_b64, "public_key")?
            .try_into()
            .map_err(|_| SignatureError::InvalidKey)?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| SignatureError::InvalidKey)?;
        let sig_bytes = decode_b64(signature_b64, "signature")?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::Malformed)?;
        key.verify_strict(message, &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// The verifier this build ships with, if any.
#[must_use]
pub fn default_signature_verifier() -> Option<Box<dyn SignatureVerifier>> {
    #[cfg(feature = "ed25519")]
    {
        Some(Box::new(Ed25519Verifier))
    }
    #[cfg(not(feature = "ed25519"))]
    {
        None
    }
}

#[cfg_attr(not(feature = "ed25519"), allow(dead_code))]
fn decode_b64(raw: &str, field: &'static str) -> Result<Vec<u8>, SignatureError> {
    STANDARD
        .decode(raw.trim())
        .map_err(|_| SignatureError::Encoding { field })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub valid: usize,
    pub total: usize,
    pub supported: bool,
}

/// Count valid signatures over `challenge`.
///
/// A signature counts only when its guardian is on the roster with the same
/// public key and the signature verifies over the 32 raw challenge bytes.
/// Unknown guardians, mismatched keys and bad signatures are skipped.
pub fn tally_signatures(
    entries: &[SignatureEntry],
    roster: &[Validator],
    challenge: &ContentHash,
    verifier: Option<&dyn SignatureVerifier>,
) -> Tally {
    let total = entries.len();
    let Some(verifier) = verifier else {
        return Tally {
            valid: 0,
            total,
            supported: false,
        };
    };

    let message = challenge.to_bytes();
    let valid = entries
        .iter()
        .filter(|entry| {
            let (Some(guardian), Some(public_key), Some(signature)) = (
                entry.guardian_id.as_deref(),
                entry.public_key.as_deref(),
                entry.signature.as_deref(),
            ) else {
                return false;
            };
            let on_roster = roster
                .iter()
                .any(|v| v.id == guardian && v.pubkey.as_deref() == Some(public_key));
            if !on_roster {
                tracing::debug!(guardian, "Signature from unknown guardian or key not counted");
                return false;
            }
            match verifier.verify(public_key, signature, &message) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(guardian, "Signature not counted: {e}");
                    false
                }
            }
        })
        .count();

    Tally {
        valid,
        total,
        supported: true,
    }
}
