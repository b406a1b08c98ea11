//! # Escrow Factory
//!
//! Creates escrows, owns the emergency gate and administers proxy
//! deployments.
//!
//! ## Creation Order
//!
//! 1. Reject a second escrow for the same (user, pool).
//! 2. Validate the threshold against the approvers the user chose.
//! 3. Append the default bot, if configured and not already present.
//! 4. Deploy, register, mark the address as a contract, emit.
//!
//! Step 2 precedes step 3 so the injected bot can never count toward a
//! threshold the user did not satisfy themselves.

use crate::domain::config::{DeploymentMode, FactoryConfig};
use crate::domain::entities::{CreatedEscrow, Deployment};
use crate::domain::errors::FactoryError;
use crate::events::FactoryEvent;
use crate::ports::inbound::EscrowDirectory;
use crate::registry::Registry;
use crate::whitelist::WhitelistManager;
use ev_01_signature_verification::SignatureVerificationApi;
use ev_02_circuit_breaker::{CircuitBreaker, GateEvent};
use ev_03_escrow::{
    ChainAccess, Escrow, EscrowDeps, EscrowError, EscrowEvent, EscrowInit, EscrowProxy,
};
use ev_telemetry::ESCROWS_CREATED;
use parking_lot::{Mutex, RwLock};
use shared_types::{keccak256, u256_to_word, Address, EventSink, Selector, TimeSource, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators of the factory and of every escrow it creates.
#[derive(Clone)]
pub struct FactoryDeps {
    pub chain: Arc<dyn ChainAccess>,
    pub verifier: Arc<dyn SignatureVerificationApi>,
    pub time: Arc<dyn TimeSource>,
    pub escrow_events: Arc<dyn EventSink<EscrowEvent>>,
    pub gate_events: Arc<dyn EventSink<GateEvent>>,
    pub factory_events: Arc<dyn EventSink<FactoryEvent>>,
}

/// Escrow factory.
pub struct EscrowFactory {
    address: Address,
    owner: RwLock<Address>,
    config: FactoryConfig,
    default_bot: RwLock<Option<Address>>,
    gate: Arc<CircuitBreaker>,
    registry: Arc<Registry>,
    whitelist: Arc<WhitelistManager>,
    deployments: RwLock<HashMap<Address, Deployment>>,
    counter: Mutex<u64>,
    deps: FactoryDeps,
}

impl std::fmt::Debug for EscrowFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowFactory")
            .field("address", &self.address)
            .field("owner", &self.owner())
            .field("deployments", &self.deployments.read().len())
            .finish_non_exhaustive()
    }
}

impl EscrowFactory {
    /// Creates a factory and its emergency gate. The gate is owned by the
    /// factory address; the factory owner drives it through this type.
    pub fn new(
        address: Address,
        owner: Address,
        config: FactoryConfig,
        registry: Arc<Registry>,
        whitelist: Arc<WhitelistManager>,
        deps: FactoryDeps,
    ) -> Result<Self, FactoryError> {
        config.validate()?;
        if address.is_zero() || owner.is_zero() {
            return Err(FactoryError::ZeroAddress);
        }

        let gate = Arc::new(CircuitBreaker::with_events(
            address,
            deps.time.clone(),
            deps.gate_events.clone(),
        ));

        info!(factory = %address, owner = %owner, mode = %config.deployment_mode, "[ev-04] factory created");

        Ok(Self {
            address,
            owner: RwLock::new(owner),
            default_bot: RwLock::new(config.default_bot),
            config,
            gate,
            registry,
            whitelist,
            deployments: RwLock::new(HashMap::new()),
            counter: Mutex::new(0),
            deps,
        })
    }

    // =========================================================================
    // ESCROW CREATION
    // =========================================================================

    /// Creates the escrow of `user` for `pool`.
    ///
    /// `max_calls` falls back to the configured default.
    pub fn create_escrow(
        &self,
        user: Address,
        pool: Address,
        approvers: Vec<Address>,
        threshold: usize,
        max_calls: Option<usize>,
    ) -> Result<CreatedEscrow, FactoryError> {
        if user.is_zero() || pool.is_zero() {
            return Err(FactoryError::ZeroAddress);
        }

        let mut counter = self.counter.lock();

        if self.registry.has_escrow_for_pool(user, pool) {
            warn!(user = %user, pool = %pool, "[ev-04] duplicate escrow request");
            return Err(FactoryError::EscrowAlreadyExists { user, pool });
        }

        if threshold == 0 || threshold > approvers.len() {
            return Err(EscrowError::ThresholdOutOfRange {
                threshold,
                approvers: approvers.len(),
            }
            .into());
        }

        let mut approvers = approvers;
        if let Some(bot) = *self.default_bot.read() {
            if !approvers.contains(&bot) {
                approvers.push(bot);
            }
        }

        let escrow_address = derive_address(self.address, user, pool, *counter);
        let init = EscrowInit {
            address: escrow_address,
            owner: user,
            pool,
            factory: self.address,
            approvers: approvers.clone(),
            threshold,
            max_calls: max_calls.unwrap_or(self.config.default_max_calls),
            ownership_delay: self.config.default_ownership_delay_secs,
            deposit_token: self.config.deposit_token,
            config: self.config.escrow_config(),
        };

        let deployment = match self.config.deployment_mode {
            DeploymentMode::Direct => {
                Deployment::Direct(Arc::new(Escrow::new(init, self.escrow_deps())?))
            }
            DeploymentMode::Proxy => {
                let proxy = Arc::new(EscrowProxy::new(
                    escrow_address,
                    self.address,
                    self.escrow_deps(),
                ));
                proxy.initialize(init)?;
                Deployment::Proxy(proxy)
            }
        };

        self.registry
            .register(self.address, escrow_address, user, pool)?;
        self.deps.chain.register_contract(escrow_address);
        let mode = deployment.mode();
        self.deployments.write().insert(escrow_address, deployment);
        *counter += 1;

        ESCROWS_CREATED.inc();
        info!(
            escrow = %escrow_address,
            user = %user,
            pool = %pool,
            approvers = approvers.len(),
            threshold,
            mode = %mode,
            "[ev-04] escrow created"
        );
        self.deps.factory_events.publish(FactoryEvent::EscrowCreated {
            user,
            pool,
            escrow: escrow_address,
            mode,
        });

        Ok(CreatedEscrow {
            escrow: escrow_address,
            user,
            pool,
            approvers,
            threshold,
            mode,
            created_at: self.deps.time.now(),
        })
    }

    /// Address the next escrow for (user, pool) would receive.
    pub fn predict_address(&self, user: Address, pool: Address) -> Address {
        derive_address(self.address, user, pool, *self.counter.lock())
    }

    /// Re-binds a proxied escrow to a fresh implementation.
    pub fn upgrade_escrow(&self, caller: Address, escrow: Address) -> Result<u32, FactoryError> {
        self.ensure_owner(caller)?;
        let proxy = match self.deployments.read().get(&escrow) {
            Some(Deployment::Proxy(proxy)) => proxy.clone(),
            Some(Deployment::Direct(_)) => return Err(FactoryError::NotUpgradeable(escrow)),
            None => return Err(FactoryError::UnknownEscrow(escrow)),
        };
        proxy.upgrade(self.address)?;
        let revision = proxy.revision();
        self.deps
            .factory_events
            .publish(FactoryEvent::EscrowUpgraded { escrow, revision });
        Ok(revision)
    }

    // =========================================================================
    // OWNER OPERATIONS
    // =========================================================================

    pub fn set_default_bot(&self, caller: Address, bot: Option<Address>) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        if bot.is_some_and(|b| b.is_zero()) {
            return Err(FactoryError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut *self.default_bot.write(), bot);
        info!(previous = ?previous, current = ?bot, "[ev-04] default bot updated");
        self.deps.factory_events.publish(FactoryEvent::DefaultBotUpdated {
            previous,
            current: bot,
        });
        Ok(())
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(FactoryError::ZeroAddress);
        }
        let previous = std::mem::replace(&mut *self.owner.write(), new_owner);
        self.deps
            .factory_events
            .publish(FactoryEvent::OwnershipTransferred {
                previous,
                current: new_owner,
            });
        Ok(())
    }

    pub fn activate_global_pause(&self, caller: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.activate_global_pause(self.address)?)
    }

    pub fn deactivate_global_pause(&self, caller: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.deactivate_global_pause(self.address)?)
    }

    pub fn pause_function(&self, caller: Address, selector: Selector) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.pause_function(self.address, selector)?)
    }

    pub fn unpause_function(&self, caller: Address, selector: Selector) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.unpause_function(self.address, selector)?)
    }

    pub fn pause_critical_functions(&self, caller: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.pause_critical_functions(self.address)?)
    }

    pub fn unpause_critical_functions(&self, caller: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.unpause_critical_functions(self.address)?)
    }

    /// The emergency admin may then pause directly on the gate.
    pub fn set_emergency_admin(&self, caller: Address, admin: Option<Address>) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.set_emergency_admin(self.address, admin)?)
    }

    /// One-way switch opening deposits to everyone.
    pub fn enable_live_mode(&self, caller: Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        Ok(self.gate.enable_live_mode(self.address)?)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        *self.owner.read()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn default_bot(&self) -> Option<Address> {
        *self.default_bot.read()
    }

    pub fn gate(&self) -> Arc<CircuitBreaker> {
        self.gate.clone()
    }

    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn whitelist(&self) -> Arc<WhitelistManager> {
        self.whitelist.clone()
    }

    pub fn escrow_count(&self) -> u64 {
        *self.counter.lock()
    }

    pub fn deployment_mode_of(&self, escrow: Address) -> Option<DeploymentMode> {
        self.deployments.read().get(&escrow).map(Deployment::mode)
    }

    pub fn proxy(&self, escrow: Address) -> Option<Arc<EscrowProxy>> {
        match self.deployments.read().get(&escrow) {
            Some(Deployment::Proxy(proxy)) => Some(proxy.clone()),
            _ => None,
        }
    }

    fn escrow_deps(&self) -> EscrowDeps {
        EscrowDeps {
            chain: self.deps.chain.clone(),
            gate: self.gate.clone(),
            whitelist: self.whitelist.clone(),
            verifier: self.deps.verifier.clone(),
            time: self.deps.time.clone(),
            events: self.deps.escrow_events.clone(),
        }
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), FactoryError> {
        if caller != *self.owner.read() {
            warn!(caller = %caller, "[ev-04] not factory owner");
            return Err(FactoryError::NotOwner(caller));
        }
        Ok(())
    }
}

impl EscrowDirectory for EscrowFactory {
    fn resolve(&self, escrow: Address) -> Option<Arc<Escrow>> {
        self.deployments.read().get(&escrow).and_then(Deployment::escrow)
    }

    fn is_registered(&self, escrow: Address) -> bool {
        self.registry.is_registered(escrow)
    }

    fn all_escrows(&self) -> Vec<Address> {
        self.registry.all_escrows()
    }
}

/// `keccak256(factory || user || pool || counter)[12..]`.
fn derive_address(factory: Address, user: Address, pool: Address, counter: u64) -> Address {
    let mut preimage = Vec::with_capacity(20 * 3 + 32);
    preimage.extend_from_slice(factory.as_bytes());
    preimage.extend_from_slice(user.as_bytes());
    preimage.extend_from_slice(pool.as_bytes());
    preimage.extend_from_slice(&u256_to_word(U256::from(counter)));
    Address::from_hash_tail(&keccak256(&preimage))
}
