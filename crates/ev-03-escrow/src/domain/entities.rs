//! # Domain Entities
//!
//! Call inputs and view outputs of the escrow.

use super::config::EscrowConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Bytes, Timestamp, U256};

/// Sender and attached native value of a payable call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub value: U256,
}

impl CallContext {
    /// A call with no value attached.
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            value: U256::zero(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }
}

/// Creation parameters of an escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowInit {
    /// Address the escrow is deployed at.
    pub address: Address,
    pub owner: Address,
    /// Pool this escrow is bound to. Immutable.
    pub pool: Address,
    /// Factory that created the escrow.
    pub factory: Address,
    pub approvers: Vec<Address>,
    pub threshold: usize,
    pub max_calls: usize,
    /// Minimum seconds between proposing and accepting an owner.
    pub ownership_delay: u64,
    /// Token pulled by the combined `deposit`.
    pub deposit_token: Option<Address>,
    pub config: EscrowConfig,
}

/// A threshold-signed call request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
    /// Opaque 65-byte `r || s || v` blobs.
    pub signatures: Vec<Vec<u8>>,
    pub deadline: Timestamp,
}

/// Asset moved by a deposit or withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Token(Address),
    Nft { collection: Address, token_id: U256 },
}

/// One executed sub-call of a multicall.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
    pub result: Bytes,
}

/// Which gates currently block the escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalStatus {
    pub paused: bool,
    pub global_emergency: bool,
    pub execute_paused: bool,
    pub multicall_paused: bool,
    pub signatures_paused: bool,
}

impl OperationalStatus {
    /// True when no gate blocks any execute path.
    pub fn is_operational(&self) -> bool {
        !self.paused
            && !self.global_emergency
            && !self.execute_paused
            && !self.multicall_paused
            && !self.signatures_paused
    }
}

/// Native and token balances at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub escrow: Address,
    pub native: U256,
    pub tokens: Vec<(Address, U256)>,
}
