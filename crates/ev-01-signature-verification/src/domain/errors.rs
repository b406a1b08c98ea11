//! # Signature Errors
//!
//! Error types for signature verification operations.

use thiserror::Error;

/// Errors that can occur during signature verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature blob is not exactly 65 bytes (`r || s || v`).
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    /// The signature format is invalid (scalar out of range, bad encoding)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,
}

impl SignatureError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidLength(_) => "invalid_length",
            Self::InvalidFormat => "invalid_format",
            Self::MalleableSignature => "malleable",
            Self::InvalidRecoveryId(_) => "invalid_recovery_id",
            Self::RecoveryFailed => "recovery_failed",
        }
    }
}
