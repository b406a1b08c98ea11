//! # ECDSA Verification (secp256k1)
//!
//! Pure domain logic for recovering approver addresses.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must not exceed SECP256K1_HALF_ORDER
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance
//! - Uses k256 crate for cryptographic operations

use super::entities::{EcdsaSignature, VerificationResult};
use super::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rayon::prelude::*;
use shared_types::{keccak256, Address, Hash};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order, rounded down (largest accepted S).
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// EIP-191 prefix for a 32-byte personal message.
const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

// =============================================================================
// ECDSA VERIFIER
// =============================================================================

/// Stateless ECDSA verifier.
#[derive(Debug, Clone, Default)]
pub struct EcdsaVerifier;

impl EcdsaVerifier {
    /// Create a new ECDSA verifier.
    pub fn new() -> Self {
        Self
    }

    /// Verify a signature over a raw 32-byte hash and recover the signer.
    pub fn verify_ecdsa(&self, message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult {
        verify_ecdsa(message_hash, signature)
    }

    /// Recover the signer of `digest` wrapped in the personal-message envelope.
    pub fn recover_signer(&self, digest: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
        let signature = EcdsaSignature::from_bytes(signature)?;
        let envelope = to_eth_signed_message_hash(digest);
        verify_ecdsa(&envelope, &signature).into_result()
    }

    /// Recover every signer of `digest` in parallel, preserving input order.
    pub fn recover_signers(
        &self,
        digest: &Hash,
        signatures: &[Vec<u8>],
    ) -> Vec<Result<Address, SignatureError>> {
        signatures
            .par_iter()
            .map(|sig| self.recover_signer(digest, sig))
            .collect()
    }
}

// =============================================================================
// CORE VERIFICATION FUNCTIONS
// =============================================================================

/// Verify an ECDSA signature and recover the signer address.
///
/// Security validations performed:
/// 1. R is in valid range [1, n-1] per SEC1 standard
/// 2. S is in valid range [1, n-1] per SEC1 standard
/// 3. S is in lower half per EIP-2 malleability protection
/// 4. Recovery ID (v) is valid (0, 1, 27, or 28)
/// 5. Public key recovery succeeds
pub fn verify_ecdsa(message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult {
    if !is_valid_scalar(&signature.r) {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }

    if !is_valid_scalar(&signature.s) {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }

    // Check malleability (EIP-2): S must be in lower half of curve order
    if !is_low_s(&signature.s) {
        return VerificationResult::invalid(SignatureError::MalleableSignature);
    }

    match recover_address(message_hash, signature) {
        Ok(address) => VerificationResult::valid(address),
        Err(e) => VerificationResult::invalid(e),
    }
}

/// Recover the signer's address from a signature over a raw hash.
///
/// Performs no malleability check; callers go through [`verify_ecdsa`].
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    use zeroize::Zeroize;

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Wraps a 32-byte digest in the EIP-191 personal-message envelope.
pub fn to_eth_signed_message_hash(digest: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + 32);
    buf.extend_from_slice(PERSONAL_MESSAGE_PREFIX);
    buf.extend_from_slice(digest);
    keccak256(&buf)
}

/// Derive an Ethereum address from a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 hash of public key (without 0x04 prefix)
    let hash = keccak256(&pubkey_slice[1..]);
    Address::from_hash_tail(&hash)
}

/// Check if S value is in lower half of curve order (EIP-2 malleability protection).
///
/// S may equal half_order; anything above is the malleated twin. Runs in
/// constant time.
pub fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let s_byte = s[i];
        let h_byte = SECP256K1_HALF_ORDER[i];

        let not_decided = !(less | greater);
        let byte_less = Choice::from((s_byte < h_byte) as u8);
        let byte_greater = Choice::from((s_byte > h_byte) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    (!greater).into()
}

/// Check if a scalar value is in valid range [1, n-1] for ECDSA. Constant time.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let s_byte = scalar[i];
        let n_byte = SECP256K1_ORDER[i];

        let not_decided = !(less | greater);
        let byte_less = Choice::from((s_byte < n_byte) as u8);
        let byte_greater = Choice::from((s_byte > n_byte) as u8);

        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    let valid = !is_zero & less;
    valid.into()
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// Invert S value: s' = n - s. Produces the malleable twin of a signature.
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}

// =============================================================================
// UNIT TESTS
// =============================================================================
