//! # Escrow Registry
//!
//! Platform-wide index of escrows. Only factories authorized by the
//! registry owner may register, and each (user, pool) pair maps to at most
//! one escrow.

use crate::domain::entities::EscrowRecord;
use crate::domain::errors::RegistryError;
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Default)]
struct RegistryState {
    authorized: HashSet<Address>,
    records: HashMap<Address, EscrowRecord>,
    by_pool: HashMap<(Address, Address), Address>,
    by_user: HashMap<Address, Vec<Address>>,
    ordered: Vec<Address>,
}

/// Escrow registry.
#[derive(Debug)]
pub struct Registry {
    owner: RwLock<Address>,
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner: RwLock::new(owner),
            state: RwLock::new(RegistryState::default()),
        }
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    pub fn authorize_factory(&self, caller: Address, factory: Address) -> Result<(), RegistryError> {
        self.ensure_owner(caller)?;
        if factory.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.state.write().authorized.insert(factory);
        info!(factory = %factory, "[ev-04] factory authorized");
        Ok(())
    }

    pub fn revoke_factory(&self, caller: Address, factory: Address) -> Result<(), RegistryError> {
        self.ensure_owner(caller)?;
        self.state.write().authorized.remove(&factory);
        info!(factory = %factory, "[ev-04] factory revoked");
        Ok(())
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), RegistryError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        *self.owner.write() = new_owner;
        Ok(())
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Records `escrow` as the escrow of `user` for `pool`.
    pub fn register(
        &self,
        caller_factory: Address,
        escrow: Address,
        user: Address,
        pool: Address,
    ) -> Result<(), RegistryError> {
        if escrow.is_zero() || user.is_zero() || pool.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }

        let mut state = self.state.write();
        if !state.authorized.contains(&caller_factory) {
            warn!(factory = %caller_factory, "[ev-04] unauthorized registration");
            return Err(RegistryError::FactoryNotAuthorized(caller_factory));
        }
        if state.by_pool.contains_key(&(user, pool)) {
            return Err(RegistryError::EscrowAlreadyExists { user, pool });
        }
        if state.records.contains_key(&escrow) {
            return Err(RegistryError::AlreadyRegistered(escrow));
        }

        state.records.insert(
            escrow,
            EscrowRecord {
                escrow,
                user,
                pool,
                factory: caller_factory,
            },
        );
        state.by_pool.insert((user, pool), escrow);
        state.by_user.entry(user).or_default().push(escrow);
        state.ordered.push(escrow);

        info!(escrow = %escrow, user = %user, pool = %pool, "[ev-04] escrow registered");
        Ok(())
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn owner(&self) -> Address {
        *self.owner.read()
    }

    pub fn is_authorized_factory(&self, factory: Address) -> bool {
        self.state.read().authorized.contains(&factory)
    }

    pub fn is_registered(&self, escrow: Address) -> bool {
        self.state.read().records.contains_key(&escrow)
    }

    pub fn has_escrow_for_pool(&self, user: Address, pool: Address) -> bool {
        self.state.read().by_pool.contains_key(&(user, pool))
    }

    pub fn escrow_for(&self, user: Address, pool: Address) -> Option<Address> {
        self.state.read().by_pool.get(&(user, pool)).copied()
    }

    pub fn escrows_of(&self, user: Address) -> Vec<Address> {
        self.state
            .read()
            .by_user
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_escrows(&self) -> Vec<Address> {
        self.state.read().ordered.clone()
    }

    pub fn pool_of(&self, escrow: Address) -> Option<Address> {
        self.state.read().records.get(&escrow).map(|r| r.pool)
    }

    pub fn record(&self, escrow: Address) -> Option<EscrowRecord> {
        self.state.read().records.get(&escrow).copied()
    }

    pub fn len(&self) -> usize {
        self.state.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != *self.owner.read() {
            return Err(RegistryError::NotOwner(caller));
        }
        Ok(())
    }
}
