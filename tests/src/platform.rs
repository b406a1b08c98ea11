//! Factory-backed fixture shared by every test module.

use ev_01_signature_verification::test_utils::LocalSigner;
use ev_01_signature_verification::SignatureVerificationService;
use ev_02_circuit_breaker::GateEvent;
use ev_03_escrow::{CallContext, Escrow, EscrowEvent, ExecutionRequest, InMemoryChain};
use ev_04_factory::{
    EscrowDirectory, EscrowFactory, FactoryConfig, FactoryDeps, FactoryEvent, Registry,
    WhitelistManager,
};
use ev_05_manager::{EscrowManager, ManagerConfig, ManagerEvent};
use shared_types::{Address, Bytes, InMemoryEventLog, ManualTimeSource, Timestamp, U256};
use std::sync::Arc;

pub(crate) const ADMIN: Address = Address::new([0xAD; 20]);
pub(crate) const FACTORY: Address = Address::new([0xFA; 20]);
pub(crate) const USER: Address = Address::new([0x0C; 20]);
pub(crate) const POOL: Address = Address::new([0x90; 20]);
pub(crate) const TARGET: Address = Address::new([0x7A; 20]);
pub(crate) const OUTSIDER: Address = Address::new([0xEE; 20]);
pub(crate) const BOT: Address = Address::new([0xB0; 20]);
pub(crate) const TOKEN: Address = Address::new([0x70; 20]);
pub(crate) const CHAIN_ID: u64 = 1;
pub(crate) const NOW: Timestamp = 1_700_000_000;

/// `n` whole units of an 18-decimal asset.
pub(crate) fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// Signers with seeds `1..=n`.
pub(crate) fn signers(n: u64) -> Vec<LocalSigner> {
    (1..=n).map(LocalSigner::from_seed).collect()
}

pub(crate) fn addresses(signers: &[LocalSigner]) -> Vec<Address> {
    signers.iter().map(LocalSigner::address).collect()
}

pub(crate) struct Platform {
    pub chain: Arc<InMemoryChain>,
    pub clock: Arc<ManualTimeSource>,
    pub factory: Arc<EscrowFactory>,
    pub escrow_log: Arc<InMemoryEventLog<EscrowEvent>>,
    pub gate_log: Arc<InMemoryEventLog<GateEvent>>,
    pub factory_log: Arc<InMemoryEventLog<FactoryEvent>>,
}

impl Platform {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    /// Registry and whitelist owned by `ADMIN`; `TARGET` and `USER` are
    /// globally allowed.
    pub fn with_config(config: FactoryConfig) -> Self {
        let chain = Arc::new(InMemoryChain::new(CHAIN_ID));
        let clock = Arc::new(ManualTimeSource::new(NOW));

        let registry = Arc::new(Registry::new(ADMIN));
        registry.authorize_factory(ADMIN, FACTORY).unwrap();
        let whitelist = Arc::new(WhitelistManager::new(ADMIN));
        whitelist.add_batch(ADMIN, &[TARGET, USER]).unwrap();

        let escrow_log = Arc::new(InMemoryEventLog::new());
        let gate_log = Arc::new(InMemoryEventLog::new());
        let factory_log = Arc::new(InMemoryEventLog::new());

        let factory = Arc::new(
            EscrowFactory::new(
                FACTORY,
                ADMIN,
                config,
                registry,
                whitelist,
                FactoryDeps {
                    chain: chain.clone(),
                    verifier: Arc::new(SignatureVerificationService::new()),
                    time: clock.clone(),
                    escrow_events: escrow_log.clone(),
                    gate_events: gate_log.clone(),
                    factory_events: factory_log.clone(),
                },
            )
            .unwrap(),
        );

        Self {
            chain,
            clock,
            factory,
            escrow_log,
            gate_log,
            factory_log,
        }
    }

    /// Creates the escrow of `USER` for `POOL`.
    pub fn create(&self, approvers: &[LocalSigner], threshold: usize) -> Arc<Escrow> {
        self.create_for(USER, POOL, approvers, threshold)
    }

    pub fn create_for(
        &self,
        user: Address,
        pool: Address,
        approvers: &[LocalSigner],
        threshold: usize,
    ) -> Arc<Escrow> {
        let created = self
            .factory
            .create_escrow(user, pool, addresses(approvers), threshold, None)
            .unwrap();
        self.factory.resolve(created.escrow).unwrap()
    }

    /// Gives `from` exactly `amount` and deposits all of it.
    pub fn fund(&self, escrow: &Escrow, from: Address, amount: U256) {
        self.chain.set_native_balance(from, amount);
        escrow
            .deposit_eth(CallContext::new(from).with_value(amount))
            .unwrap();
    }

    pub fn manager(&self) -> EscrowManager {
        EscrowManager::new(
            ADMIN,
            ManagerConfig::default(),
            self.factory.clone(),
            Arc::new(InMemoryEventLog::<ManagerEvent>::new()),
        )
        .unwrap()
    }
}

/// A request to send `value` to `target`, signed by every signer in `by`
/// over the escrow's current nonce.
pub(crate) fn signed_request(
    escrow: &Escrow,
    by: &[&LocalSigner],
    target: Address,
    value: U256,
    data: &[u8],
    deadline: Timestamp,
) -> ExecutionRequest {
    let payload = escrow.execution_payload(target, value, data, deadline);
    ExecutionRequest {
        target,
        value,
        data: Bytes::from(data.to_vec()),
        signatures: by.iter().map(|s| s.sign_payload(&payload)).collect(),
        deadline,
    }
}
