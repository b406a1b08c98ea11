//! Batch inputs and aggregation outputs.

use super::errors::ManagerError;
use ev_03_escrow::ExecutionRequest;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Bytes, U256};
use uuid::Uuid;

/// One bot execution inside a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub user: Address,
    pub escrow: Address,
    pub request: ExecutionRequest,
    /// Bot nonce the item expects for `user`.
    pub bot_nonce: u64,
}

/// Per-item outcome of a batch. Items never affect each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub results: Vec<Result<Bytes, ManagerError>>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Value locked across every resolvable registered escrow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TvlReport {
    pub escrows: usize,
    pub native: U256,
    pub tokens: Vec<(Address, U256)>,
}
