//! # Signature Verification Service
//!
//! Application service implementing `SignatureVerificationApi` on top of
//! the domain ECDSA routines.

use crate::domain::ecdsa::EcdsaVerifier;
use crate::domain::entities::{EcdsaSignature, VerificationResult};
use crate::domain::errors::SignatureError;
use crate::ports::inbound::SignatureVerificationApi;
use shared_types::{Address, Hash};
use tracing::debug;

/// Signature Verification Service.
///
/// Stateless; cheap to clone and share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerificationService {
    verifier: EcdsaVerifier,
}

impl SignatureVerificationService {
    /// Create a new signature verification service.
    pub fn new() -> Self {
        Self {
            verifier: EcdsaVerifier::new(),
        }
    }
}

impl SignatureVerificationApi for SignatureVerificationService {
    fn verify_ecdsa(&self, message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult {
        self.verifier.verify_ecdsa(message_hash, signature)
    }

    fn recover_signer(&self, digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
        let result = self.verifier.recover_signer(digest, signature);
        if let Err(ref err) = result {
            debug!(reason = err.reason(), "[ev-01] signature rejected");
        }
        result
    }

    fn recover_signers(
        &self,
        digest: &Hash,
        signatures: &[Vec<u8>],
    ) -> Vec<Result<Address, SignatureError>> {
        self.verifier.recover_signers(digest, signatures)
    }
}
