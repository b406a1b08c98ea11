//! Delayed two-phase ownership.
//!
//! A proposal becomes acceptable `delay` seconds after it was made. The
//! pending candidate and its availability time live in one `Option`, so one
//! can never be set without the other.

use super::errors::EscrowError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOwnership {
    pub candidate: Address,
    pub available_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
    pending: Option<PendingOwnership>,
    delay: u64,
}

impl Ownership {
    pub fn new(owner: Address, delay: u64) -> Result<Self, EscrowError> {
        if owner.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        Ok(Self {
            owner,
            pending: None,
            delay,
        })
    }

    /// Rebuilds ownership from persisted fields.
    pub fn restore(owner: Address, pending: Option<PendingOwnership>, delay: u64) -> Self {
        Self {
            owner,
            pending,
            delay,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending(&self) -> Option<PendingOwnership> {
        self.pending
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<(), EscrowError> {
        if caller != self.owner {
            return Err(EscrowError::NotOwner(caller));
        }
        Ok(())
    }

    /// Records `candidate` as pending, replacing any earlier proposal.
    pub fn propose(
        &mut self,
        candidate: Address,
        now: Timestamp,
    ) -> Result<PendingOwnership, EscrowError> {
        if candidate.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        let available_at = now.checked_add(self.delay).ok_or(EscrowError::Overflow)?;
        let pending = PendingOwnership {
            candidate,
            available_at,
        };
        self.pending = Some(pending);
        Ok(pending)
    }

    /// Completes the transfer. Returns the previous owner.
    pub fn accept(&mut self, caller: Address, now: Timestamp) -> Result<Address, EscrowError> {
        let pending = self.pending.ok_or(EscrowError::NoPendingOwnership)?;
        if caller != pending.candidate {
            return Err(EscrowError::NotPendingOwner(caller));
        }
        if now < pending.available_at {
            return Err(EscrowError::OwnershipDelayNotElapsed {
                available_at: pending.available_at,
            });
        }
        let previous = std::mem::replace(&mut self.owner, pending.candidate);
        self.pending = None;
        Ok(previous)
    }

    /// Drops the pending proposal. Returns the cancelled candidate.
    pub fn cancel(&mut self) -> Result<Address, EscrowError> {
        self.pending
            .take()
            .map(|p| p.candidate)
            .ok_or(EscrowError::NoPendingOwnership)
    }
}
