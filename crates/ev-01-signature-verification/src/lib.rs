//! # Signature Verification Subsystem (EV-01)
//!
//! Recovers approver addresses from off-chain signatures over escrow
//! execution payloads.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): The `SignatureVerificationApi` trait
//! - **Service Layer** (`service.rs`): Default implementation of the API
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: Signatures with high S values are rejected
//! - **Scalar Range**: R and S must be in `[1, n-1]`
//! - **Personal-Message Envelope (EIP-191)**: Recovery always runs on
//!   `keccak256("\x19Ethereum Signed Message:\n32" || digest)`
//! - **Replay Binding**: the canonical payload commits to escrow, owner,
//!   chain id, target, value, data hash, nonce and deadline

pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use domain::ecdsa::{
    address_from_pubkey, invert_s, is_low_s, recover_address, to_eth_signed_message_hash,
    verify_ecdsa, EcdsaVerifier, SECP256K1_HALF_ORDER,
};
pub use domain::entities::{EcdsaSignature, VerificationResult, SIGNATURE_LENGTH};
pub use domain::errors::SignatureError;
pub use domain::payload::ExecutionPayload;
pub use ports::inbound::SignatureVerificationApi;
pub use service::SignatureVerificationService;
