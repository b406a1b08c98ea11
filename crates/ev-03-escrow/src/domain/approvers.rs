//! # Approver Set
//!
//! Ordered approver list, its membership index and the signature threshold.
//!
//! ## Invariants
//!
//! - No duplicates, no zero address.
//! - `1 <= threshold <= len`, after every operation. Operations that would
//!   break it fail and leave the set untouched.
//! - `members` mirrors `approvers` exactly.

use super::errors::EscrowError;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::HashSet;

/// Bounded approver set with threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverSet {
    approvers: Vec<Address>,
    members: HashSet<Address>,
    threshold: usize,
    capacity: usize,
}

impl ApproverSet {
    /// Builds a set, validating every invariant.
    pub fn new(
        approvers: Vec<Address>,
        threshold: usize,
        capacity: usize,
    ) -> Result<Self, EscrowError> {
        if approvers.len() > capacity {
            return Err(EscrowError::TooManyApprovers { max: capacity });
        }

        let mut members = HashSet::with_capacity(approvers.len());
        for approver in &approvers {
            if approver.is_zero() {
                return Err(EscrowError::ZeroAddress);
            }
            if !members.insert(*approver) {
                return Err(EscrowError::DuplicateApprover(*approver));
            }
        }

        check_threshold(threshold, approvers.len())?;

        Ok(Self {
            approvers,
            members,
            threshold,
            capacity,
        })
    }

    pub fn approvers(&self) -> &[Address] {
        &self.approvers
    }

    pub fn len(&self) -> usize {
        self.approvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvers.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Appends an approver.
    pub fn add(&mut self, approver: Address) -> Result<(), EscrowError> {
        if approver.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        if self.members.contains(&approver) {
            return Err(EscrowError::DuplicateApprover(approver));
        }
        if self.approvers.len() >= self.capacity {
            return Err(EscrowError::TooManyApprovers { max: self.capacity });
        }
        self.approvers.push(approver);
        self.members.insert(approver);
        Ok(())
    }

    /// Removes every occurrence of `approver`, keeping the order of the rest.
    ///
    /// The removal is allowed while at least `threshold` approvers remain
    /// (`remaining >= threshold`), not only while more than `threshold`
    /// remain. A 3-of-3 set therefore cannot shrink, and a 2-of-3 set can
    /// drop to 2-of-2.
    pub fn remove(&mut self, approver: Address) -> Result<(), EscrowError> {
        if !self.members.contains(&approver) {
            return Err(EscrowError::NotAnApprover(approver));
        }

        let occurrences = self.approvers.iter().filter(|a| **a == approver).count();
        let remaining = self.approvers.len() - occurrences;
        if remaining < self.threshold {
            return Err(EscrowError::WouldBreakThreshold {
                remaining,
                threshold: self.threshold,
            });
        }

        self.approvers.retain(|a| *a != approver);
        self.members.remove(&approver);
        Ok(())
    }

    /// Replaces the threshold.
    pub fn set_threshold(&mut self, threshold: usize) -> Result<(), EscrowError> {
        check_threshold(threshold, self.approvers.len())?;
        self.threshold = threshold;
        Ok(())
    }

    /// True when the membership index mirrors the ordered list and the
    /// threshold is in range.
    pub fn is_consistent(&self) -> bool {
        let listed: HashSet<Address> = self.approvers.iter().copied().collect();
        listed.len() == self.approvers.len()
            && listed == self.members
            && self.threshold >= 1
            && self.threshold <= self.approvers.len()
    }
}

fn check_threshold(threshold: usize, approvers: usize) -> Result<(), EscrowError> {
    if threshold == 0 || threshold > approvers {
        return Err(EscrowError::ThresholdOutOfRange {
            threshold,
            approvers,
        });
    }
    Ok(())
}
