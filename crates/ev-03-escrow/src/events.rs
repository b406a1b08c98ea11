//! # Escrow Events
//!
//! Audit events carry enough data to replay every state transition from the
//! log alone. They are published only after the outermost transaction on
//! the ledger committed; events of a rolled-back call are never observed,
//! even when another escrow's call was the one that failed.

use crate::domain::entities::{Asset, CallRecord};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Bytes, Timestamp, U256};

/// An event emitted by one escrow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowEvent {
    pub escrow: Address,
    pub kind: EscrowEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEventKind {
    Deposited {
        from: Address,
        asset: Asset,
        amount: U256,
    },
    Withdrawn {
        to: Address,
        asset: Asset,
        amount: U256,
        /// What the recipient actually gained (differs for fee-on-transfer tokens).
        received: U256,
    },
    Executed {
        target: Address,
        value: U256,
        data: Bytes,
        result: Bytes,
    },
    MulticallExecuted {
        calls: Vec<CallRecord>,
    },
    SignedExecution {
        target: Address,
        value: U256,
        data: Bytes,
        result: Bytes,
        signers: Vec<Address>,
        /// Nonce consumed by this execution.
        nonce: U256,
    },
    ApproverAdded {
        approver: Address,
    },
    ApproverRemoved {
        approver: Address,
    },
    ThresholdUpdated {
        previous: usize,
        current: usize,
    },
    OwnershipTransferProposed {
        current: Address,
        proposed: Address,
        available_at: Timestamp,
    },
    OwnershipTransferCancelled {
        cancelled: Address,
    },
    OwnershipTransferred {
        previous: Address,
        current: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    MaxCallsUpdated {
        previous: usize,
        current: usize,
    },
}
