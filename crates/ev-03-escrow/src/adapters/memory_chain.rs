//! # In-Memory Chain
//!
//! A ledger of native, token and NFT balances with pluggable contract
//! behaviour. Snapshots clone the whole ledger, which keeps revert semantics
//! exact at the cost of memory; fine for tests and simulations.
//!
//! Every call runs under the ledger's [`TransactionJournal`] lock with its
//! own frame, so escrow state committed inside a reverted call is undone
//! along with the ledger.

use crate::domain::config::BPS_DENOMINATOR;
use crate::domain::errors::ChainError;
use crate::domain::journal::TransactionJournal;
use crate::ports::outbound::{CallRequest, ChainAccess, SnapshotId};
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, Bytes, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Behaviour of a contract installed on the chain.
///
/// The handler runs after the call value was credited to the callee and may
/// call back into the chain. Returning `Err` reverts the whole call.
pub trait CallHandler: Send + Sync {
    fn handle(&self, chain: &dyn ChainAccess, request: &CallRequest) -> Result<Bytes, String>;
}

impl<F> CallHandler for F
where
    F: Fn(&dyn ChainAccess, &CallRequest) -> Result<Bytes, String> + Send + Sync,
{
    fn handle(&self, chain: &dyn ChainAccess, request: &CallRequest) -> Result<Bytes, String> {
        self(chain, request)
    }
}

#[derive(Clone, Debug, Default)]
struct Ledger {
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    nfts: HashMap<(Address, U256), Address>,
    contracts: HashSet<Address>,
    calls: Vec<CallRequest>,
}

/// Moves `amount` out of `from`, crediting `received` to `to`. Writes
/// nothing unless both sides succeed.
fn move_balance<K: std::hash::Hash + Eq + Copy>(
    balances: &mut HashMap<K, U256>,
    from: K,
    to: K,
    owner: Address,
    amount: U256,
    received: U256,
) -> Result<(), ChainError> {
    let available = balances.get(&from).copied().unwrap_or_default();
    let remaining = available
        .checked_sub(amount)
        .ok_or(ChainError::InsufficientBalance {
            account: owner,
            required: amount,
            available,
        })?;

    if from == to {
        let kept = remaining.checked_add(received).ok_or(ChainError::Overflow)?;
        balances.insert(from, kept);
        return Ok(());
    }

    let credited = balances
        .get(&to)
        .copied()
        .unwrap_or_default()
        .checked_add(received)
        .ok_or(ChainError::Overflow)?;
    balances.insert(from, remaining);
    balances.insert(to, credited);
    Ok(())
}

fn credit<K: std::hash::Hash + Eq + Copy>(
    balances: &mut HashMap<K, U256>,
    key: K,
    amount: U256,
) -> Result<(), ChainError> {
    let entry = balances.entry(key).or_default();
    *entry = entry.checked_add(amount).ok_or(ChainError::Overflow)?;
    Ok(())
}

/// In-memory `ChainAccess` implementation.
pub struct InMemoryChain {
    chain_id: u64,
    ledger: RwLock<Ledger>,
    snapshots: Mutex<Vec<Ledger>>,
    handlers: RwLock<HashMap<Address, Arc<dyn CallHandler>>>,
    token_fees: RwLock<HashMap<Address, u16>>,
    journal: TransactionJournal,
}

impl std::fmt::Debug for InMemoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChain")
            .field("chain_id", &self.chain_id)
            .field("snapshots", &self.snapshots.lock().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ledger: RwLock::new(Ledger::default()),
            snapshots: Mutex::new(Vec::new()),
            handlers: RwLock::new(HashMap::new()),
            token_fees: RwLock::new(HashMap::new()),
            journal: TransactionJournal::new(),
        }
    }

    // =========================================================================
    // FIXTURES
    // =========================================================================

    pub fn set_native_balance(&self, account: Address, amount: U256) {
        self.ledger.write().native.insert(account, amount);
    }

    pub fn mint_token(&self, token: Address, to: Address, amount: U256) -> Result<(), ChainError> {
        credit(&mut self.ledger.write().tokens, (token, to), amount)
    }

    pub fn mint_nft(&self, collection: Address, token_id: U256, to: Address) {
        self.ledger.write().nfts.insert((collection, token_id), to);
    }

    /// Charges `bps` of every transfer of `token`; the fee is burned.
    pub fn set_token_fee(&self, token: Address, bps: u16) {
        self.token_fees.write().insert(token, bps.min(BPS_DENOMINATOR));
    }

    /// Deploys a contract whose calls are served by `handler`.
    pub fn install_contract(&self, address: Address, handler: Arc<dyn CallHandler>) {
        self.register_contract(address);
        self.handlers.write().insert(address, handler);
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.ledger
            .read()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Every call that completed and was not reverted, in call order.
    pub fn calls(&self) -> Vec<CallRequest> {
        self.ledger.read().calls.clone()
    }

    fn fee_for(&self, token: Address, amount: U256) -> U256 {
        let bps = self.token_fees.read().get(&token).copied().unwrap_or(0);
        if bps == 0 {
            return U256::zero();
        }
        // amount * bps cannot overflow for amounts below 2^242.
        amount.saturating_mul(U256::from(bps)) / U256::from(BPS_DENOMINATOR)
    }
}

impl ChainAccess for InMemoryChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn native_balance(&self, account: Address) -> U256 {
        self.ledger
            .read()
            .native
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        move_balance(&mut self.ledger.write().native, from, to, from, amount, amount)
    }

    fn token_balance(&self, token: Address, account: Address) -> U256 {
        self.ledger
            .read()
            .tokens
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_token(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let fee = self.fee_for(token, amount);
        move_balance(
            &mut self.ledger.write().tokens,
            (token, from),
            (token, to),
            from,
            amount,
            amount.saturating_sub(fee),
        )?;
        debug!(token = %token, from = %from, to = %to, amount = %amount, fee = %fee, "[chain] token transfer");
        Ok(())
    }

    fn transfer_token_from(
        &self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let key = (token, from, spender);
        let available = self.allowance(token, from, spender);
        let remaining = available
            .checked_sub(amount)
            .ok_or(ChainError::InsufficientAllowance {
                required: amount,
                available,
            })?;
        self.transfer_token(token, from, to, amount)?;
        self.ledger.write().allowances.insert(key, remaining);
        Ok(())
    }

    fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        self.ledger
            .write()
            .allowances
            .insert((token, owner, spender), amount);
        Ok(())
    }

    fn nft_owner(&self, collection: Address, token_id: U256) -> Option<Address> {
        self.ledger.read().nfts.get(&(collection, token_id)).copied()
    }

    fn transfer_nft(
        &self,
        collection: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), ChainError> {
        let mut ledger = self.ledger.write();
        match ledger.nfts.get(&(collection, token_id)) {
            Some(owner) if *owner == from => {
                ledger.nfts.insert((collection, token_id), to);
                Ok(())
            }
            _ => Err(ChainError::NotTokenOwner(from)),
        }
    }

    fn is_contract(&self, account: Address) -> bool {
        self.ledger.read().contracts.contains(&account)
    }

    fn register_contract(&self, account: Address) {
        self.ledger.write().contracts.insert(account);
    }

    fn call(&self, request: CallRequest) -> Result<Bytes, ChainError> {
        let _serial = self.journal.serialize();
        let snapshot = self.snapshot();
        self.journal.begin();

        let outcome = (|| {
            self.transfer_native(request.from, request.to, request.value)?;
            self.ledger.write().calls.push(request.clone());

            let handler = self.handlers.read().get(&request.to).cloned();
            match handler {
                Some(handler) => handler
                    .handle(self, &request)
                    .map_err(ChainError::CallReverted),
                None => Ok(Bytes::new()),
            }
        })()
        .and_then(|result| {
            self.discard(snapshot)?;
            Ok(result)
        });

        match outcome {
            Ok(result) => {
                self.journal.commit(None, None);
                Ok(result)
            }
            Err(err) => {
                self.journal.rollback();
                self.revert_to(snapshot)?;
                debug!(to = %request.to, error = %err, "[chain] call reverted");
                Err(err)
            }
        }
    }

    fn snapshot(&self) -> SnapshotId {
        let ledger = self.ledger.read().clone();
        let mut snapshots = self.snapshots.lock();
        snapshots.push(ledger);
        snapshots.len() - 1
    }

    fn revert_to(&self, id: SnapshotId) -> Result<(), ChainError> {
        let restored = {
            let mut snapshots = self.snapshots.lock();
            if id >= snapshots.len() {
                return Err(ChainError::UnknownSnapshot(id));
            }
            snapshots.truncate(id + 1);
            snapshots.pop().ok_or(ChainError::UnknownSnapshot(id))?
        };
        *self.ledger.write() = restored;
        Ok(())
    }

    fn discard(&self, id: SnapshotId) -> Result<(), ChainError> {
        let mut snapshots = self.snapshots.lock();
        if id >= snapshots.len() {
            return Err(ChainError::UnknownSnapshot(id));
        }
        snapshots.truncate(id);
        Ok(())
    }

    fn journal(&self) -> &TransactionJournal {
        &self.journal
    }
}
