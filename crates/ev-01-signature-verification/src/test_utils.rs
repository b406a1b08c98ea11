//! Deterministic local signer for tests.
//!
//! Keys are derived from a `u64` seed so fixtures are reproducible across
//! crates. Not for production key management.

use crate::domain::ecdsa::{address_from_pubkey, invert_s, to_eth_signed_message_hash};
use crate::domain::entities::{EcdsaSignature, SIGNATURE_LENGTH};
use crate::domain::payload::ExecutionPayload;
use k256::ecdsa::SigningKey;
use shared_types::{keccak256, Address, Hash};

/// A secp256k1 key that signs the way an approver wallet would.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Derives a key from `seed`. Distinct seeds give distinct keys.
    pub fn from_seed(seed: u64) -> Self {
        let mut counter = 0u64;
        loop {
            let mut material = b"escrow-vault/local-signer".to_vec();
            material.extend_from_slice(&seed.to_be_bytes());
            material.extend_from_slice(&counter.to_be_bytes());
            if let Ok(key) = SigningKey::from_slice(&keccak256(&material)) {
                return Self::from_signing_key(key);
            }
            counter += 1;
        }
    }

    /// Wraps an existing key.
    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = address_from_pubkey(key.verifying_key());
        Self { key, address }
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs a raw 32-byte hash with low-s normalization and `v` in {27, 28}.
    pub fn sign_hash(&self, hash: &Hash) -> EcdsaSignature {
        let (sig, recid) = match self.key.sign_prehash_recoverable(hash) {
            Ok(pair) => pair,
            Err(err) => panic!("prehash signing failed: {err}"),
        };

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig.r().to_bytes());
        s.copy_from_slice(&sig.s().to_bytes());
        let mut v = recid.to_byte();

        if let Some(normalized) = sig.normalize_s() {
            s.copy_from_slice(&normalized.s().to_bytes());
            v ^= 1;
        }

        EcdsaSignature { r, s, v: v + 27 }
    }

    /// Signs `digest` inside the personal-message envelope, returning the 65-byte blob.
    pub fn sign_digest(&self, digest: &Hash) -> Vec<u8> {
        self.sign_hash(&to_eth_signed_message_hash(digest))
            .to_bytes()
            .to_vec()
    }

    /// Signs an execution payload.
    pub fn sign_payload(&self, payload: &ExecutionPayload) -> Vec<u8> {
        self.sign_digest(&payload.digest())
    }

    /// Returns the high-s twin of a signature blob (s' = n - s, v flipped).
    pub fn malleate(signature: &[u8]) -> Vec<u8> {
        let mut out = signature.to_vec();
        if out.len() != SIGNATURE_LENGTH {
            return out;
        }
        let mut s = [0u8; 32];
        s.copy_from_slice(&out[32..64]);
        out[32..64].copy_from_slice(&invert_s(&s));
        out[64] = match out[64] {
            27 => 28,
            28 => 27,
            0 => 1,
            _ => 0,
        };
        out
    }
}
