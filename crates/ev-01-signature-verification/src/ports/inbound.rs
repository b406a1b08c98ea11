//! # Inbound Ports (Driving Ports / API)
//!
//! The public API escrows use to authenticate approver signatures.

use crate::domain::entities::{EcdsaSignature, VerificationResult};
use crate::domain::errors::SignatureError;
use crate::domain::payload::ExecutionPayload;
use shared_types::{Address, Hash};

/// Primary Signature Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`); a single verifier is
/// shared by every escrow.
pub trait SignatureVerificationApi: Send + Sync {
    /// Verify a signature over a raw 32-byte hash and recover the signer.
    ///
    /// # Security
    /// - Rejects signatures with high S values (EIP-2 malleability protection)
    fn verify_ecdsa(&self, message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult;

    /// Recover the signer of an opaque 65-byte blob over `digest`.
    ///
    /// The personal-message envelope is applied to `digest` before recovery.
    fn recover_signer(&self, digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError>;

    /// Recover many signers of the same digest, one result per input, in order.
    fn recover_signers(
        &self,
        digest: &Hash,
        signatures: &[Vec<u8>],
    ) -> Vec<Result<Address, SignatureError>>;

    /// Returns true if `signature` over `payload` was produced by `expected`.
    fn verify_signer(&self, payload: &ExecutionPayload, signature: &[u8], expected: Address) -> bool {
        matches!(self.recover_signer(&payload.digest(), signature), Ok(addr) if addr == expected)
    }
}
