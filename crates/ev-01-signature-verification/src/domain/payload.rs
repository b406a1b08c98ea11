//! # Execution Payload
//!
//! The canonical tuple every approver signs before a signature-gated
//! execution. It is never persisted: the escrow rebuilds it from live state
//! (current owner, current nonce) at verification time, so a signature only
//! matches while that state is unchanged.

use serde::{Deserialize, Serialize};
use shared_types::{keccak256, u256_to_word, Address, Hash, U256};

/// Packed size of the payload preimage.
const PREIMAGE_LENGTH: usize = 20 + 20 + 32 + 20 + 32 + 32 + 32 + 32;

/// Parameters bound by an approver signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayload {
    /// Escrow that will perform the call.
    pub escrow: Address,
    /// Escrow owner at signing time.
    pub owner: Address,
    /// Chain the escrow lives on.
    pub chain_id: u64,
    /// Call target.
    pub target: Address,
    /// Native value forwarded with the call.
    pub value: U256,
    /// `keccak256(data)`.
    pub data_hash: Hash,
    /// Escrow nonce at signing time.
    pub nonce: U256,
    /// Unix time after which the signature is void.
    pub deadline: u64,
}

impl ExecutionPayload {
    /// Builds a payload, hashing `data`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        escrow: Address,
        owner: Address,
        chain_id: u64,
        target: Address,
        value: U256,
        data: &[u8],
        nonce: U256,
        deadline: u64,
    ) -> Self {
        Self {
            escrow,
            owner,
            chain_id,
            target,
            value,
            data_hash: keccak256(data),
            nonce,
            deadline,
        }
    }

    /// Packed preimage: addresses as 20 bytes, integers as 32-byte big-endian words.
    pub fn encode_packed(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PREIMAGE_LENGTH);
        buf.extend_from_slice(self.escrow.as_bytes());
        buf.extend_from_slice(self.owner.as_bytes());
        buf.extend_from_slice(&u256_to_word(U256::from(self.chain_id)));
        buf.extend_from_slice(self.target.as_bytes());
        buf.extend_from_slice(&u256_to_word(self.value));
        buf.extend_from_slice(&self.data_hash);
        buf.extend_from_slice(&u256_to_word(self.nonce));
        buf.extend_from_slice(&u256_to_word(U256::from(self.deadline)));
        buf
    }

    /// The message hash approvers sign (before the personal-message envelope).
    pub fn digest(&self) -> Hash {
        keccak256(&self.encode_packed())
    }

    /// The hash signature recovery actually runs on.
    pub fn signing_hash(&self) -> Hash {
        super::ecdsa::to_eth_signed_message_hash(&self.digest())
    }
}
