//! # Domain Entities
//!
//! Core data structures for signature verification.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Length of a serialized signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Parses an opaque `r || s || v` blob as supplied by callers.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Serializes back into the 65-byte wire form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Result of signature verification.
#[derive(Clone, Debug)]
pub struct VerificationResult {
    /// Whether the signature is valid
    pub valid: bool,
    /// The recovered address (if verification succeeded)
    pub recovered_address: Option<Address>,
    /// Error details (if verification failed)
    pub error: Option<SignatureError>,
}

impl VerificationResult {
    /// Create a successful verification result.
    pub fn valid(recovered_address: Address) -> Self {
        Self {
            valid: true,
            recovered_address: Some(recovered_address),
            error: None,
        }
    }

    /// Create a failed verification result.
    pub fn invalid(error: SignatureError) -> Self {
        Self {
            valid: false,
            recovered_address: None,
            error: Some(error),
        }
    }

    /// Collapses the result into a `Result`.
    pub fn into_result(self) -> Result<Address, SignatureError> {
        match (self.recovered_address, self.error) {
            (Some(address), None) => Ok(address),
            (_, Some(err)) => Err(err),
            (None, None) => Err(SignatureError::RecoveryFailed),
        }
    }
}
