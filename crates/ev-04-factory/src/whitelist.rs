//! # Whitelist Manager
//!
//! Owner-mutated allow set consulted by every escrow for call targets,
//! contract withdrawal recipients and dev-mode depositors.
//!
//! Entries are either global or scoped to one escrow (the caller context).

use crate::domain::errors::WhitelistError;
use ev_03_escrow::WhitelistStore;
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::{HashMap, HashSet};
use tracing::info;

#[derive(Debug, Default)]
struct Entries {
    global: HashSet<Address>,
    scoped: HashMap<Address, HashSet<Address>>,
}

/// Shared whitelist.
#[derive(Debug)]
pub struct WhitelistManager {
    owner: RwLock<Address>,
    entries: RwLock<Entries>,
}

impl WhitelistManager {
    pub fn new(owner: Address) -> Self {
        Self {
            owner: RwLock::new(owner),
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Allows `target` for every escrow. Returns false if already present.
    pub fn add(&self, caller: Address, target: Address) -> Result<bool, WhitelistError> {
        self.ensure_owner(caller)?;
        if target.is_zero() {
            return Err(WhitelistError::ZeroAddress);
        }
        let added = self.entries.write().global.insert(target);
        info!(target = %target, added, "[ev-04] whitelist add");
        Ok(added)
    }

    /// Returns false if `target` was not present.
    pub fn remove(&self, caller: Address, target: Address) -> Result<bool, WhitelistError> {
        self.ensure_owner(caller)?;
        let removed = self.entries.write().global.remove(&target);
        info!(target = %target, removed, "[ev-04] whitelist remove");
        Ok(removed)
    }

    /// Adds every target or none. Returns how many were new.
    pub fn add_batch(&self, caller: Address, targets: &[Address]) -> Result<usize, WhitelistError> {
        self.ensure_owner(caller)?;
        if targets.is_empty() {
            return Err(WhitelistError::EmptyBatch);
        }
        if targets.iter().any(Address::is_zero) {
            return Err(WhitelistError::ZeroAddress);
        }
        let mut entries = self.entries.write();
        let added = targets
            .iter()
            .filter(|t| entries.global.insert(**t))
            .count();
        info!(count = targets.len(), added, "[ev-04] whitelist batch add");
        Ok(added)
    }

    /// Returns how many were removed.
    pub fn remove_batch(&self, caller: Address, targets: &[Address]) -> Result<usize, WhitelistError> {
        self.ensure_owner(caller)?;
        if targets.is_empty() {
            return Err(WhitelistError::EmptyBatch);
        }
        let mut entries = self.entries.write();
        let removed = targets
            .iter()
            .filter(|t| entries.global.remove(*t))
            .count();
        info!(count = targets.len(), removed, "[ev-04] whitelist batch remove");
        Ok(removed)
    }

    /// Allows `target` only for calls made by `escrow`.
    pub fn allow_for(
        &self,
        caller: Address,
        escrow: Address,
        target: Address,
    ) -> Result<bool, WhitelistError> {
        self.ensure_owner(caller)?;
        if escrow.is_zero() || target.is_zero() {
            return Err(WhitelistError::ZeroAddress);
        }
        Ok(self
            .entries
            .write()
            .scoped
            .entry(escrow)
            .or_default()
            .insert(target))
    }

    pub fn revoke_for(
        &self,
        caller: Address,
        escrow: Address,
        target: Address,
    ) -> Result<bool, WhitelistError> {
        self.ensure_owner(caller)?;
        let mut entries = self.entries.write();
        let removed = entries
            .scoped
            .get_mut(&escrow)
            .is_some_and(|set| set.remove(&target));
        if entries.scoped.get(&escrow).is_some_and(HashSet::is_empty) {
            entries.scoped.remove(&escrow);
        }
        Ok(removed)
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), WhitelistError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(WhitelistError::ZeroAddress);
        }
        *self.owner.write() = new_owner;
        Ok(())
    }

    pub fn owner(&self) -> Address {
        *self.owner.read()
    }

    pub fn is_globally_allowed(&self, target: Address) -> bool {
        self.entries.read().global.contains(&target)
    }

    /// Global entries, sorted.
    pub fn global_entries(&self) -> Vec<Address> {
        let mut entries: Vec<_> = self.entries.read().global.iter().copied().collect();
        entries.sort();
        entries
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), WhitelistError> {
        if caller != *self.owner.read() {
            return Err(WhitelistError::NotOwner(caller));
        }
        Ok(())
    }
}

impl WhitelistStore for WhitelistManager {
    fn is_allowed(&self, target: Address, caller_context: Address) -> bool {
        let entries = self.entries.read();
        entries.global.contains(&target)
            || entries
                .scoped
                .get(&caller_context)
                .is_some_and(|set| set.contains(&target))
    }
}
