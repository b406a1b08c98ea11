//! Per-escrow policy fixed at creation.

use super::errors::EscrowError;
use serde::{Deserialize, Serialize};

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Absolute ceiling on sub-calls per multicall, whatever `max_calls` says.
pub const MAX_CALLS_HARD_CAP: usize = 50;

/// Maximum approvers per escrow.
pub const MAX_APPROVERS: usize = 10;

/// Escrow policy knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Minimum share of a token withdrawal the recipient must actually
    /// receive, in basis points. Tolerates fee-on-transfer tokens.
    pub min_received_bps: u16,
    /// Ceiling applied on top of the configurable `max_calls`.
    pub max_calls_hard_cap: usize,
    /// Approver set capacity.
    pub max_approvers: usize,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            min_received_bps: 9_500,
            max_calls_hard_cap: MAX_CALLS_HARD_CAP,
            max_approvers: MAX_APPROVERS,
        }
    }
}

impl EscrowConfig {
    pub fn validate(&self) -> Result<(), EscrowError> {
        if self.min_received_bps > BPS_DENOMINATOR {
            return Err(EscrowError::InvalidConfig(format!(
                "min_received_bps {} exceeds {}",
                self.min_received_bps, BPS_DENOMINATOR
            )));
        }
        if self.max_calls_hard_cap == 0 || self.max_calls_hard_cap > MAX_CALLS_HARD_CAP {
            return Err(EscrowError::InvalidConfig(format!(
                "max_calls_hard_cap {} out of range",
                self.max_calls_hard_cap
            )));
        }
        if self.max_approvers == 0 || self.max_approvers > MAX_APPROVERS {
            return Err(EscrowError::InvalidConfig(format!(
                "max_approvers {} out of range",
                self.max_approvers
            )));
        }
        Ok(())
    }
}
