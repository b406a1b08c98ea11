//! # Persisted Storage Layout
//!
//! The upgrade-safe representation of an escrow. Field order is part of the
//! format: new fields are appended after the last existing one and the
//! reserved gap shrinks by the same number of slots, so a newer
//! implementation can always read an older record.
//!
//! ```text
//! v1: layout_version | address | owner | pending_owner | pending_owner_available_at
//!     | ownership_delay | approvers | threshold | nonce | max_calls | pool
//!     | paused | factory | deposit_token | min_received_bps
//!     | max_calls_hard_cap | max_approvers | reserved[50]
//! ```

use super::errors::EscrowError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp, U256};

/// Current layout version.
pub const STORAGE_LAYOUT_VERSION: u32 = 1;

/// Reserved slots kept at the tail of the layout.
pub const RESERVED_SLOTS: usize = 50;

/// Flat, ordered escrow record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowStorage {
    pub layout_version: u32,
    pub address: Address,
    pub owner: Address,
    /// Zero when no transfer is pending.
    pub pending_owner: Address,
    /// Zero exactly when `pending_owner` is zero.
    pub pending_owner_available_at: Timestamp,
    pub ownership_delay: u64,
    pub approvers: Vec<Address>,
    pub threshold: u64,
    pub nonce: U256,
    pub max_calls: u64,
    pub pool: Address,
    pub paused: bool,
    pub factory: Address,
    /// Zero when no deposit token is configured.
    pub deposit_token: Address,
    pub min_received_bps: u16,
    pub max_calls_hard_cap: u64,
    pub max_approvers: u64,
    pub reserved: Vec<[u8; 32]>,
}

impl EscrowStorage {
    /// A zeroed reserved gap of the current size.
    pub fn empty_gap() -> Vec<[u8; 32]> {
        vec![[0u8; 32]; RESERVED_SLOTS]
    }

    /// Encodes the record with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, EscrowError> {
        bincode::serialize(self).map_err(|e| EscrowError::CorruptStorage(e.to_string()))
    }

    /// Decodes and validates a record.
    pub fn decode(bytes: &[u8]) -> Result<Self, EscrowError> {
        let storage: Self =
            bincode::deserialize(bytes).map_err(|e| EscrowError::CorruptStorage(e.to_string()))?;
        storage.validate()?;
        Ok(storage)
    }

    /// Checks version, gap size and the pending-owner pairing.
    pub fn validate(&self) -> Result<(), EscrowError> {
        if self.layout_version != STORAGE_LAYOUT_VERSION {
            return Err(EscrowError::CorruptStorage(format!(
                "unsupported layout version {}",
                self.layout_version
            )));
        }
        if self.reserved.len() != RESERVED_SLOTS {
            return Err(EscrowError::CorruptStorage(format!(
                "reserved gap has {} slots, expected {}",
                self.reserved.len(),
                RESERVED_SLOTS
            )));
        }
        if self.pending_owner.is_zero() != (self.pending_owner_available_at == 0) {
            return Err(EscrowError::CorruptStorage(
                "pending owner and availability disagree".to_string(),
            ));
        }
        Ok(())
    }
}
