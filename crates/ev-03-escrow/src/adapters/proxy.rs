//! # Proxy Deployment
//!
//! An escrow deployed behind a stable address whose implementation can be
//! replaced by the proxy admin. State survives an upgrade by passing through
//! the persisted [`EscrowStorage`] layout, the same path a real storage slot
//! migration takes.

use crate::domain::entities::EscrowInit;
use crate::domain::errors::EscrowError;
use crate::domain::storage::EscrowStorage;
use crate::service::{Escrow, EscrowDeps};
use parking_lot::RwLock;
use shared_types::Address;
use std::sync::Arc;
use tracing::{info, warn};

/// Stable handle in front of a replaceable escrow implementation.
pub struct EscrowProxy {
    address: Address,
    admin: Address,
    deps: EscrowDeps,
    implementation: RwLock<Option<Arc<Escrow>>>,
    revision: RwLock<u32>,
}

impl std::fmt::Debug for EscrowProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowProxy")
            .field("address", &self.address)
            .field("admin", &self.admin)
            .field("initialized", &self.is_initialized())
            .field("revision", &*self.revision.read())
            .finish()
    }
}

impl EscrowProxy {
    pub fn new(address: Address, admin: Address, deps: EscrowDeps) -> Self {
        Self {
            address,
            admin,
            deps,
            implementation: RwLock::new(None),
            revision: RwLock::new(0),
        }
    }

    /// Binds the first implementation. Runs exactly once.
    pub fn initialize(&self, init: EscrowInit) -> Result<Arc<Escrow>, EscrowError> {
        if init.address != self.address {
            return Err(EscrowError::InvalidConfig(format!(
                "proxy {} cannot initialize escrow {}",
                self.address, init.address
            )));
        }

        let mut slot = self.implementation.write();
        if slot.is_some() {
            warn!(proxy = %self.address, "[ev-03] repeated proxy initialization");
            return Err(EscrowError::AlreadyInitialized);
        }

        let escrow = Arc::new(Escrow::new(init, self.deps.clone())?);
        *slot = Some(escrow.clone());
        *self.revision.write() = 1;
        info!(proxy = %self.address, admin = %self.admin, "[ev-03] proxy initialized");
        Ok(escrow)
    }

    /// The current implementation.
    pub fn implementation(&self) -> Result<Arc<Escrow>, EscrowError> {
        self.implementation
            .read()
            .clone()
            .ok_or(EscrowError::NotInitialized)
    }

    /// Replaces the implementation, carrying every stored field over.
    ///
    /// The previous implementation is retired, so handles obtained before
    /// the upgrade reject every mutating call. Upgrades run only outside any
    /// ledger transaction.
    pub fn upgrade(&self, caller: Address) -> Result<Arc<Escrow>, EscrowError> {
        if caller != self.admin {
            return Err(EscrowError::NotProxyAdmin(caller));
        }

        let journal = self.deps.chain.journal();
        let _serial = journal.serialize();
        if journal.depth() > 0 {
            warn!(proxy = %self.address, "[ev-03] upgrade attempted inside a transaction");
            return Err(EscrowError::ReentrantCall);
        }

        let mut slot = self.implementation.write();
        let current = slot.as_ref().ok_or(EscrowError::NotInitialized)?;

        let bytes = current.to_storage().encode()?;
        let storage = EscrowStorage::decode(&bytes)?;
        let upgraded = Arc::new(Escrow::from_storage(&storage, self.deps.clone())?);

        current.retire();
        *slot = Some(upgraded.clone());
        let mut revision = self.revision.write();
        *revision += 1;
        info!(proxy = %self.address, revision = *revision, "[ev-03] proxy upgraded");
        Ok(upgraded)
    }

    pub fn is_initialized(&self) -> bool {
        self.implementation.read().is_some()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Number of implementations bound so far; zero before initialization.
    pub fn revision(&self) -> u32 {
        *self.revision.read()
    }
}
