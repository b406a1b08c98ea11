//! # Ports Layer
//!
//! Outbound ports the escrow consumes. The emergency gate and signature
//! verifier ports are defined by their own subsystems and re-exported here.

pub mod outbound;

pub use ev_01_signature_verification::SignatureVerificationApi;
pub use ev_02_circuit_breaker::EmergencyStatus;
pub use outbound::{CallRequest, ChainAccess, SnapshotId, WhitelistStore};
