//! # EV-03 Escrow
//!
//! Per-user, per-pool vault holding native value, fungible tokens and NFTs.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Execution Paths
//!
//! | Path | Authorized by | Value source |
//! |------|---------------|--------------|
//! | `execute` | owner | attached value, exact match |
//! | `multicall` | owner | attached value, exact sum |
//! | `execute_with_signatures` | `threshold` distinct approvers | escrow balance |
//!
//! Signed calls bind escrow, owner, chain id, target, value, data hash,
//! nonce and deadline. Changing the owner or consuming the nonce voids every
//! outstanding signature.
//!
//! ## Security Properties
//!
//! - **Atomicity**: a failed entry point leaves balances, escrow state and
//!   the event log exactly as they were, including the state of any other
//!   escrow it reached through an outbound call
//! - **Reentrancy**: outbound-calling entry points share one guard per escrow
//! - **Withdrawal liveness**: the owner can always withdraw, whatever the
//!   pause or emergency state
//!
//! ## Module Structure
//!
//! ```text
//! ev-03-escrow/
//! ├── domain/          # Approvers, ownership, guard, journal, config, storage, errors
//! ├── ports/           # ChainAccess, WhitelistStore
//! ├── adapters/        # InMemoryChain, EscrowProxy
//! ├── events.rs        # EscrowEvent
//! └── service.rs       # Escrow
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use adapters::{CallHandler, EscrowProxy, InMemoryChain};
pub use domain::approvers::ApproverSet;
pub use domain::config::{EscrowConfig, BPS_DENOMINATOR, MAX_APPROVERS, MAX_CALLS_HARD_CAP};
pub use domain::entities::{
    Asset, BalanceSnapshot, CallContext, CallRecord, EscrowInit, ExecutionRequest,
    OperationalStatus,
};
pub use domain::errors::{ChainError, ErrorKind, EscrowError};
pub use domain::guard::ReentrancyGuard;
pub use domain::journal::{Effect, TransactionJournal};
pub use domain::ownership::{Ownership, PendingOwnership};
pub use domain::storage::{EscrowStorage, RESERVED_SLOTS, STORAGE_LAYOUT_VERSION};
pub use events::{EscrowEvent, EscrowEventKind};
pub use ports::outbound::{CallRequest, ChainAccess, SnapshotId, WhitelistStore};
pub use service::{Escrow, EscrowDeps};
