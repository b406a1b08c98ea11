//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the escrow depends on:
//! - Ledger access and outbound calls (`ChainAccess`)
//! - Call-target allow list (`WhitelistStore`)
//!
//! Both are shared by many escrows. An escrow only queries the whitelist; it
//! mutates the chain only through its own balances and calls.

use crate::domain::errors::ChainError;
use crate::domain::journal::TransactionJournal;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Bytes, U256};

/// Handle of a ledger snapshot. Snapshots nest and must be released in
/// LIFO order.
pub type SnapshotId = usize;

/// A value-carrying call from one account to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

// =============================================================================
// CHAIN ACCESS
// =============================================================================

/// Ledger of native, ERC20-style and ERC721-style balances plus arbitrary
/// calls.
pub trait ChainAccess: Send + Sync {
    /// Identifier bound into every signed payload.
    fn chain_id(&self) -> u64;

    fn native_balance(&self, account: Address) -> U256;

    fn transfer_native(&self, from: Address, to: Address, amount: U256)
        -> Result<(), ChainError>;

    fn token_balance(&self, token: Address, account: Address) -> U256;

    /// Moves `amount` of `token`. The recipient may receive less if the
    /// token charges a transfer fee.
    fn transfer_token(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError>;

    /// Moves tokens on behalf of `from`, consuming `spender`'s allowance.
    fn transfer_token_from(
        &self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError>;

    fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ChainError>;

    fn nft_owner(&self, collection: Address, token_id: U256) -> Option<Address>;

    fn transfer_nft(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), ChainError>;

    /// True if code is deployed at `account`.
    fn is_contract(&self, account: Address) -> bool;

    /// Marks `account` as holding code.
    fn register_contract(&self, account: Address);

    /// Transfers `value` and invokes the callee. A failed call leaves no
    /// trace on the ledger.
    fn call(&self, request: CallRequest) -> Result<Bytes, ChainError>;

    /// Captures the full ledger.
    fn snapshot(&self) -> SnapshotId;

    /// Restores the ledger captured by `id` and releases it with every later
    /// snapshot.
    fn revert_to(&self, id: SnapshotId) -> Result<(), ChainError>;

    /// Releases `id` and every later snapshot, keeping the current ledger.
    fn discard(&self, id: SnapshotId) -> Result<(), ChainError>;

    /// Off-ledger effects scoped like the snapshots. Every participant that
    /// snapshots this ledger opens a frame under the journal's lock.
    fn journal(&self) -> &TransactionJournal;
}

// =============================================================================
// WHITELIST
// =============================================================================

/// Allow list consulted before every outbound call.
pub trait WhitelistStore: Send + Sync {
    /// True if `caller_context` (usually the calling escrow) may interact
    /// with `target`.
    fn is_allowed(&self, target: Address, caller_context: Address) -> bool;
}
