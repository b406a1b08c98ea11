//! # Escrow Service
//!
//! The escrow state machine. One instance per (user, pool).
//!
//! ## Execution Model
//!
//! Every mutating entry point runs inside [`Escrow::transact`]: the escrow
//! state is cloned, a chain snapshot is taken and events are buffered. On
//! `Err` all three are rolled back; on `Ok` the snapshot is released and the
//! restore and publish steps are handed to the ledger's
//! [`TransactionJournal`](crate::domain::journal::TransactionJournal). Events
//! reach the sink only when the outermost transaction on the ledger commits,
//! whichever escrow opened it. A failure further out restores this escrow's
//! state too.
//!
//! Top-level transactions on one ledger are serialized by the journal lock.
//! A retired implementation (replaced by a proxy upgrade) rejects every
//! mutating call.
//!
//! Entry points that can reach an untrusted address (withdrawals, execute,
//! multicall, signature execution) additionally hold the reentrancy guard.
//! The state lock is never held across an outbound call.
//!
//! ## Gates
//!
//! | Operation | Escrow pause | Global pause | Function pause | Depositor gate |
//! |-----------|--------------|--------------|----------------|----------------|
//! | deposits | yes | yes | yes | yes |
//! | execute, multicall, signatures | yes | yes | yes | no |
//! | approver management | no | yes | yes | no |
//! | withdrawals | no | no | no | no |

use crate::domain::approvers::ApproverSet;
use crate::domain::config::{EscrowConfig, BPS_DENOMINATOR};
use crate::domain::entities::{
    Asset, BalanceSnapshot, CallContext, CallRecord, EscrowInit, ExecutionRequest,
    OperationalStatus,
};
use crate::domain::errors::{ChainError, EscrowError};
use crate::domain::guard::ReentrancyGuard;
use crate::domain::journal::Effect;
use crate::domain::ownership::{Ownership, PendingOwnership};
use crate::domain::storage::{EscrowStorage, STORAGE_LAYOUT_VERSION};
use crate::events::{EscrowEvent, EscrowEventKind};
use crate::ports::outbound::{CallRequest, ChainAccess, WhitelistStore};
use ev_01_signature_verification::{ExecutionPayload, SignatureVerificationApi};
use ev_02_circuit_breaker::{selectors, EmergencyStatus};
use ev_telemetry::{EMERGENCY_PAUSES, EXECUTIONS, SIGNATURE_REJECTIONS};
use parking_lot::RwLock;
use shared_types::{Address, Bytes, EventSink, Hash, Selector, TimeSource, Timestamp, U256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Collaborators injected into every escrow. Shared across escrows.
#[derive(Clone)]
pub struct EscrowDeps {
    pub chain: Arc<dyn ChainAccess>,
    pub gate: Arc<dyn EmergencyStatus>,
    pub whitelist: Arc<dyn WhitelistStore>,
    pub verifier: Arc<dyn SignatureVerificationApi>,
    pub time: Arc<dyn TimeSource>,
    pub events: Arc<dyn EventSink<EscrowEvent>>,
}

#[derive(Clone, Debug)]
struct EscrowState {
    ownership: Ownership,
    approvers: ApproverSet,
    nonce: U256,
    max_calls: usize,
    paused: bool,
}

/// A multi-signature escrow.
pub struct Escrow {
    address: Address,
    pool: Address,
    factory: Address,
    deposit_token: Option<Address>,
    config: EscrowConfig,
    state: Arc<RwLock<EscrowState>>,
    guard: ReentrancyGuard,
    retired: AtomicBool,
    deps: EscrowDeps,
}

impl std::fmt::Debug for Escrow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Escrow")
            .field("address", &self.address)
            .field("pool", &self.pool)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl Escrow {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Creates an escrow, validating every creation parameter.
    pub fn new(init: EscrowInit, deps: EscrowDeps) -> Result<Self, EscrowError> {
        init.config.validate()?;
        if init.address.is_zero() || init.pool.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        if init.deposit_token.is_some_and(|t| t.is_zero()) {
            return Err(EscrowError::ZeroAddress);
        }
        check_max_calls(init.max_calls, &init.config)?;

        let ownership = Ownership::new(init.owner, init.ownership_delay)?;
        let approvers =
            ApproverSet::new(init.approvers, init.threshold, init.config.max_approvers)?;

        info!(
            escrow = %init.address,
            owner = %init.owner,
            pool = %init.pool,
            approvers = approvers.len(),
            threshold = approvers.threshold(),
            "[ev-03] escrow created"
        );

        Ok(Self {
            address: init.address,
            pool: init.pool,
            factory: init.factory,
            deposit_token: init.deposit_token,
            config: init.config,
            state: Arc::new(RwLock::new(EscrowState {
                ownership,
                approvers,
                nonce: U256::zero(),
                max_calls: init.max_calls,
                paused: false,
            })),
            guard: ReentrancyGuard::new(),
            retired: AtomicBool::new(false),
            deps,
        })
    }

    /// Rebuilds an escrow from its persisted layout.
    pub fn from_storage(storage: &EscrowStorage, deps: EscrowDeps) -> Result<Self, EscrowError> {
        storage.validate()?;

        let config = EscrowConfig {
            min_received_bps: storage.min_received_bps,
            max_calls_hard_cap: to_usize(storage.max_calls_hard_cap)?,
            max_approvers: to_usize(storage.max_approvers)?,
        };
        config.validate()?;

        let max_calls = to_usize(storage.max_calls)?;
        check_max_calls(max_calls, &config)?;

        let approvers = ApproverSet::new(
            storage.approvers.clone(),
            to_usize(storage.threshold)?,
            config.max_approvers,
        )?;

        let pending = (!storage.pending_owner.is_zero()).then_some(PendingOwnership {
            candidate: storage.pending_owner,
            available_at: storage.pending_owner_available_at,
        });
        if storage.owner.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        let ownership = Ownership::restore(storage.owner, pending, storage.ownership_delay);

        debug!(escrow = %storage.address, nonce = %storage.nonce, "[ev-03] escrow restored");

        Ok(Self {
            address: storage.address,
            pool: storage.pool,
            factory: storage.factory,
            deposit_token: (!storage.deposit_token.is_zero()).then_some(storage.deposit_token),
            config,
            state: Arc::new(RwLock::new(EscrowState {
                ownership,
                approvers,
                nonce: storage.nonce,
                max_calls,
                paused: storage.paused,
            })),
            guard: ReentrancyGuard::new(),
            retired: AtomicBool::new(false),
            deps,
        })
    }

    /// Snapshot of the persisted layout.
    pub fn to_storage(&self) -> EscrowStorage {
        let state = self.state.read();
        let pending = state.ownership.pending();
        EscrowStorage {
            layout_version: STORAGE_LAYOUT_VERSION,
            address: self.address,
            owner: state.ownership.owner(),
            pending_owner: pending.map(|p| p.candidate).unwrap_or_default(),
            pending_owner_available_at: pending.map(|p| p.available_at).unwrap_or_default(),
            ownership_delay: state.ownership.delay(),
            approvers: state.approvers.approvers().to_vec(),
            threshold: state.approvers.threshold() as u64,
            nonce: state.nonce,
            max_calls: state.max_calls as u64,
            pool: self.pool,
            paused: state.paused,
            factory: self.factory,
            deposit_token: self.deposit_token.unwrap_or_default(),
            min_received_bps: self.config.min_received_bps,
            max_calls_hard_cap: self.config.max_calls_hard_cap as u64,
            max_approvers: self.config.max_approvers as u64,
            reserved: EscrowStorage::empty_gap(),
        }
    }

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    /// Receives the attached native value.
    pub fn deposit_eth(&self, ctx: CallContext) -> Result<(), EscrowError> {
        self.transact("deposit_eth", |events| {
            self.ensure_can_deposit(ctx.sender, selectors::DEPOSIT_ETH)?;
            if ctx.value.is_zero() {
                return Err(EscrowError::ZeroAmount);
            }
            self.receive_value(&ctx)?;
            events.push(EscrowEventKind::Deposited {
                from: ctx.sender,
                asset: Asset::Native,
                amount: ctx.value,
            });
            info!(escrow = %self.address, from = %ctx.sender, amount = %ctx.value, "[ev-03] native deposit");
            Ok(())
        })
    }

    /// Pulls `amount` of `token` from `sender`, which must have approved the escrow.
    ///
    /// Returns the amount actually credited.
    pub fn deposit_token(
        &self,
        sender: Address,
        token: Address,
        amount: U256,
    ) -> Result<U256, EscrowError> {
        self.transact("deposit_token", |events| {
            self.ensure_can_deposit(sender, selectors::DEPOSIT_TOKEN)?;
            let received = self.pull_token(sender, token, amount)?;
            events.push(EscrowEventKind::Deposited {
                from: sender,
                asset: Asset::Token(token),
                amount: received,
            });
            info!(escrow = %self.address, from = %sender, token = %token, amount = %received, "[ev-03] token deposit");
            Ok(received)
        })
    }

    /// Receives the attached native value and pulls `token_amount` of the
    /// configured deposit token in one call.
    pub fn deposit(&self, ctx: CallContext, token_amount: U256) -> Result<(), EscrowError> {
        self.transact("deposit", |events| {
            self.ensure_can_deposit(ctx.sender, selectors::DEPOSIT)?;
            if ctx.value.is_zero() && token_amount.is_zero() {
                return Err(EscrowError::ZeroAmount);
            }

            if !ctx.value.is_zero() {
                self.receive_value(&ctx)?;
                events.push(EscrowEventKind::Deposited {
                    from: ctx.sender,
                    asset: Asset::Native,
                    amount: ctx.value,
                });
            }

            if !token_amount.is_zero() {
                let token = self.deposit_token.ok_or(EscrowError::NoDepositToken)?;
                let received = self.pull_token(ctx.sender, token, token_amount)?;
                events.push(EscrowEventKind::Deposited {
                    from: ctx.sender,
                    asset: Asset::Token(token),
                    amount: received,
                });
            }

            info!(escrow = %self.address, from = %ctx.sender, "[ev-03] combined deposit");
            Ok(())
        })
    }

    // =========================================================================
    // WITHDRAWALS (always available to the owner)
    // =========================================================================

    /// Sends the whole native balance to `to`. Returns the amount sent.
    pub fn withdraw_eth(&self, caller: Address, to: Address) -> Result<U256, EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("withdraw_eth", |events| {
                let owner = self.ensure_owner(caller)?;
                self.ensure_recipient(to, owner)?;

                let balance = self.deps.chain.native_balance(self.address);
                if balance.is_zero() {
                    return Err(EscrowError::NothingToWithdraw);
                }
                self.deps.chain.transfer_native(self.address, to, balance)?;

                events.push(EscrowEventKind::Withdrawn {
                    to,
                    asset: Asset::Native,
                    amount: balance,
                    received: balance,
                });
                info!(escrow = %self.address, to = %to, amount = %balance, "[ev-03] native withdrawal");
                Ok(balance)
            })
        })
    }

    /// Sends the whole `token` balance to `to`.
    ///
    /// Tolerates transfer fees up to `1 - min_received_bps`; a larger
    /// shortfall aborts. Returns the amount the recipient received.
    pub fn withdraw_token(
        &self,
        caller: Address,
        token: Address,
        to: Address,
    ) -> Result<U256, EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("withdraw_token", |events| {
                let owner = self.ensure_owner(caller)?;
                if token.is_zero() {
                    return Err(EscrowError::ZeroAddress);
                }
                self.ensure_recipient(to, owner)?;

                let chain = &self.deps.chain;
                let balance = chain.token_balance(token, self.address);
                if balance.is_zero() {
                    return Err(EscrowError::NothingToWithdraw);
                }

                let before = chain.token_balance(token, to);
                chain.transfer_token(token, self.address, to, balance)?;
                let received = chain.token_balance(token, to).saturating_sub(before);

                let minimum = balance
                    .checked_mul(U256::from(self.config.min_received_bps))
                    .ok_or(EscrowError::Overflow)?
                    / U256::from(BPS_DENOMINATOR);
                if received < minimum {
                    return Err(EscrowError::TransferShortfall { received, minimum });
                }

                events.push(EscrowEventKind::Withdrawn {
                    to,
                    asset: Asset::Token(token),
                    amount: balance,
                    received,
                });
                info!(
                    escrow = %self.address,
                    token = %token,
                    to = %to,
                    amount = %balance,
                    received = %received,
                    "[ev-03] token withdrawal"
                );
                Ok(received)
            })
        })
    }

    /// Sends one NFT held by the escrow to `to`.
    pub fn withdraw_nft(
        &self,
        caller: Address,
        collection: Address,
        token_id: U256,
        to: Address,
    ) -> Result<(), EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("withdraw_nft", |events| {
                let owner = self.ensure_owner(caller)?;
                if collection.is_zero() {
                    return Err(EscrowError::ZeroAddress);
                }
                self.ensure_recipient(to, owner)?;

                if self.deps.chain.nft_owner(collection, token_id) != Some(self.address) {
                    return Err(EscrowError::NothingToWithdraw);
                }
                self.deps
                    .chain
                    .transfer_nft(collection, self.address, to, token_id)?;

                events.push(EscrowEventKind::Withdrawn {
                    to,
                    asset: Asset::Nft {
                        collection,
                        token_id,
                    },
                    amount: U256::one(),
                    received: U256::one(),
                });
                info!(escrow = %self.address, collection = %collection, to = %to, "[ev-03] nft withdrawal");
                Ok(())
            })
        })
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    /// Owner-only call to a whitelisted target. `value` must equal the
    /// attached value exactly.
    pub fn execute(
        &self,
        ctx: CallContext,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<Bytes, EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("execute", |events| {
                let paused = {
                    let state = self.state.read();
                    state.ownership.ensure_owner(ctx.sender)?;
                    state.paused
                };
                self.ensure_operational(paused, selectors::execute())?;
                self.ensure_target(target)?;
                if value != ctx.value {
                    return Err(EscrowError::ValueMismatch {
                        declared: value,
                        attached: ctx.value,
                    });
                }

                self.receive_value(&ctx)?;
                let result = self.invoke(target, value, data.clone())?;

                EXECUTIONS.with_label_values(&["direct"]).inc();
                info!(escrow = %self.address, target = %target, value = %value, "[ev-03] executed");
                events.push(EscrowEventKind::Executed {
                    target,
                    value,
                    data,
                    result: result.clone(),
                });
                Ok(result)
            })
        })
    }

    /// Owner-only batch of calls. All succeed or none is kept.
    pub fn multicall(
        &self,
        ctx: CallContext,
        targets: &[Address],
        values: &[U256],
        datas: &[Bytes],
    ) -> Result<Vec<Bytes>, EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("multicall", |events| {
                let (paused, max_calls) = {
                    let state = self.state.read();
                    state.ownership.ensure_owner(ctx.sender)?;
                    (state.paused, state.max_calls)
                };
                self.ensure_operational(paused, selectors::multicall())?;

                if targets.len() != values.len() || targets.len() != datas.len() {
                    return Err(EscrowError::ArrayLengthMismatch);
                }
                if targets.is_empty() {
                    return Err(EscrowError::EmptyBatch);
                }
                let limit = max_calls.min(self.config.max_calls_hard_cap);
                if targets.len() > limit {
                    return Err(EscrowError::TooManyCalls {
                        count: targets.len(),
                        max: limit,
                    });
                }

                let mut total = U256::zero();
                for (target, value) in targets.iter().zip(values) {
                    if *target == self.address {
                        return Err(EscrowError::SelfCallForbidden);
                    }
                    self.ensure_target(*target)?;
                    total = total.checked_add(*value).ok_or(EscrowError::Overflow)?;
                }
                if total != ctx.value {
                    return Err(EscrowError::ValueMismatch {
                        declared: total,
                        attached: ctx.value,
                    });
                }

                self.receive_value(&ctx)?;

                let mut records = Vec::with_capacity(targets.len());
                for (index, ((target, value), data)) in
                    targets.iter().zip(values).zip(datas).enumerate()
                {
                    let result = self
                        .invoke(*target, *value, data.clone())
                        .map_err(|err| EscrowError::SubCallFailed {
                            index,
                            reason: err.to_string(),
                        })?;
                    debug!(escrow = %self.address, index, target = %target, "[ev-03] sub-call ok");
                    records.push(CallRecord {
                        target: *target,
                        value: *value,
                        data: data.clone(),
                        result,
                    });
                }

                EXECUTIONS.with_label_values(&["multicall"]).inc();
                info!(escrow = %self.address, calls = records.len(), "[ev-03] multicall executed");
                let results = records.iter().map(|r| r.result.clone()).collect();
                events.push(EscrowEventKind::MulticallExecuted { calls: records });
                Ok(results)
            })
        })
    }

    /// Threshold-signed call. Anyone may submit; the signatures authorize.
    ///
    /// Consumes exactly one nonce on success and none on failure.
    pub fn execute_with_signatures(
        &self,
        caller: Address,
        request: &ExecutionRequest,
    ) -> Result<Bytes, EscrowError> {
        let _serial = self.deps.chain.journal().serialize();
        self.guard.guarded(|| {
            self.transact("execute_with_signatures", |events| {
                let (owner, nonce, threshold, paused) = {
                    let state = self.state.read();
                    (
                        state.ownership.owner(),
                        state.nonce,
                        state.approvers.threshold(),
                        state.paused,
                    )
                };
                self.ensure_operational(paused, selectors::execute_with_signatures())?;
                self.ensure_target(request.target)?;

                if request.signatures.len() < threshold {
                    SIGNATURE_REJECTIONS.with_label_values(&["insufficient"]).inc();
                    return Err(EscrowError::InsufficientSignatures {
                        provided: request.signatures.len(),
                        threshold,
                    });
                }

                let now = self.deps.time.now();
                if now >= request.deadline {
                    return Err(EscrowError::DeadlineExpired {
                        deadline: request.deadline,
                        now,
                    });
                }

                let payload = ExecutionPayload::new(
                    self.address,
                    owner,
                    self.deps.chain.chain_id(),
                    request.target,
                    request.value,
                    request.data.as_slice(),
                    nonce,
                    request.deadline,
                );
                let signers = self.authenticate(&payload, &request.signatures, threshold)?;

                let available = self.deps.chain.native_balance(self.address);
                if request.value > available {
                    return Err(EscrowError::InsufficientBalance {
                        required: request.value,
                        available,
                    });
                }

                let result = self.invoke(request.target, request.value, request.data.clone())?;

                {
                    let mut state = self.state.write();
                    state.nonce = state
                        .nonce
                        .checked_add(U256::one())
                        .ok_or(EscrowError::Overflow)?;
                }

                EXECUTIONS.with_label_values(&["signatures"]).inc();
                info!(
                    escrow = %self.address,
                    target = %request.target,
                    value = %request.value,
                    nonce = %nonce,
                    signers = signers.len(),
                    caller = %caller,
                    "[ev-03] signed execution"
                );
                events.push(EscrowEventKind::SignedExecution {
                    target: request.target,
                    value: request.value,
                    data: request.data.clone(),
                    result: result.clone(),
                    signers,
                    nonce,
                });
                Ok(result)
            })
        })
    }

    // =========================================================================
    // APPROVER MANAGEMENT
    // =========================================================================

    pub fn add_approver(&self, caller: Address, approver: Address) -> Result<(), EscrowError> {
        self.transact("add_approver", |events| {
            self.ensure_owner(caller)?;
            self.ensure_no_emergency(Selector::from_signature(selectors::ADD_APPROVER))?;
            self.state.write().approvers.add(approver)?;
            info!(escrow = %self.address, approver = %approver, "[ev-03] approver added");
            events.push(EscrowEventKind::ApproverAdded { approver });
            Ok(())
        })
    }

    /// Removes `approver`; fails if fewer than `threshold` approvers would remain.
    pub fn remove_approver(&self, caller: Address, approver: Address) -> Result<(), EscrowError> {
        self.transact("remove_approver", |events| {
            self.ensure_owner(caller)?;
            self.ensure_no_emergency(Selector::from_signature(selectors::REMOVE_APPROVER))?;
            self.state.write().approvers.remove(approver)?;
            info!(escrow = %self.address, approver = %approver, "[ev-03] approver removed");
            events.push(EscrowEventKind::ApproverRemoved { approver });
            Ok(())
        })
    }

    pub fn update_threshold(&self, caller: Address, threshold: usize) -> Result<(), EscrowError> {
        self.transact("update_threshold", |events| {
            self.ensure_owner(caller)?;
            self.ensure_no_emergency(Selector::from_signature(selectors::UPDATE_THRESHOLD))?;
            let previous = {
                let mut state = self.state.write();
                let previous = state.approvers.threshold();
                state.approvers.set_threshold(threshold)?;
                previous
            };
            info!(escrow = %self.address, previous, current = threshold, "[ev-03] threshold updated");
            events.push(EscrowEventKind::ThresholdUpdated {
                previous,
                current: threshold,
            });
            Ok(())
        })
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    /// Starts the delayed transfer to `new_owner`, replacing any pending one.
    pub fn propose_ownership_transfer(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Timestamp, EscrowError> {
        self.transact("propose_ownership_transfer", |events| {
            let now = self.deps.time.now();
            let mut state = self.state.write();
            state.ownership.ensure_owner(caller)?;
            let pending = state.ownership.propose(new_owner, now)?;
            info!(
                escrow = %self.address,
                proposed = %new_owner,
                available_at = pending.available_at,
                "[ev-03] ownership transfer proposed"
            );
            events.push(EscrowEventKind::OwnershipTransferProposed {
                current: caller,
                proposed: new_owner,
                available_at: pending.available_at,
            });
            Ok(pending.available_at)
        })
    }

    /// Completes a pending transfer once the delay has elapsed.
    pub fn accept_ownership(&self, caller: Address) -> Result<(), EscrowError> {
        self.transact("accept_ownership", |events| {
            let now = self.deps.time.now();
            let previous = self.state.write().ownership.accept(caller, now)?;
            info!(escrow = %self.address, previous = %previous, current = %caller, "[ev-03] ownership transferred");
            events.push(EscrowEventKind::OwnershipTransferred {
                previous,
                current: caller,
            });
            Ok(())
        })
    }

    /// Drops the pending transfer.
    pub fn cancel_ownership_transfer(&self, caller: Address) -> Result<(), EscrowError> {
        self.transact("cancel_ownership_transfer", |events| {
            let mut state = self.state.write();
            state.ownership.ensure_owner(caller)?;
            let cancelled = state.ownership.cancel()?;
            info!(escrow = %self.address, cancelled = %cancelled, "[ev-03] ownership transfer cancelled");
            events.push(EscrowEventKind::OwnershipTransferCancelled { cancelled });
            Ok(())
        })
    }

    // =========================================================================
    // ESCROW SETTINGS
    // =========================================================================

    pub fn pause(&self, caller: Address) -> Result<(), EscrowError> {
        self.transact("pause", |events| {
            let mut state = self.state.write();
            state.ownership.ensure_owner(caller)?;
            if state.paused {
                return Err(EscrowError::EscrowPaused);
            }
            state.paused = true;
            EMERGENCY_PAUSES.with_label_values(&["escrow"]).inc();
            warn!(escrow = %self.address, "[ev-03] escrow paused");
            events.push(EscrowEventKind::Paused { by: caller });
            Ok(())
        })
    }

    pub fn unpause(&self, caller: Address) -> Result<(), EscrowError> {
        self.transact("unpause", |events| {
            let mut state = self.state.write();
            state.ownership.ensure_owner(caller)?;
            if !state.paused {
                return Err(EscrowError::EscrowNotPaused);
            }
            state.paused = false;
            info!(escrow = %self.address, "[ev-03] escrow unpaused");
            events.push(EscrowEventKind::Unpaused { by: caller });
            Ok(())
        })
    }

    /// Sets the multicall size limit, within `1..=max_calls_hard_cap`.
    pub fn update_max_calls(&self, caller: Address, max_calls: usize) -> Result<(), EscrowError> {
        self.transact("update_max_calls", |events| {
            let mut state = self.state.write();
            state.ownership.ensure_owner(caller)?;
            check_max_calls(max_calls, &self.config)?;
            let previous = std::mem::replace(&mut state.max_calls, max_calls);
            events.push(EscrowEventKind::MaxCallsUpdated {
                previous,
                current: max_calls,
            });
            Ok(())
        })
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn deposit_token_address(&self) -> Option<Address> {
        self.deposit_token
    }

    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.state.read().ownership.owner()
    }

    pub fn pending_ownership(&self) -> Option<PendingOwnership> {
        self.state.read().ownership.pending()
    }

    pub fn ownership_delay(&self) -> u64 {
        self.state.read().ownership.delay()
    }

    pub fn approvers(&self) -> Vec<Address> {
        self.state.read().approvers.approvers().to_vec()
    }

    pub fn approver_count(&self) -> usize {
        self.state.read().approvers.len()
    }

    pub fn is_approver(&self, address: Address) -> bool {
        self.state.read().approvers.contains(&address)
    }

    /// True when the approver list, its membership index and the threshold agree.
    pub fn approvers_consistent(&self) -> bool {
        self.state.read().approvers.is_consistent()
    }

    pub fn threshold(&self) -> usize {
        self.state.read().approvers.threshold()
    }

    pub fn nonce(&self) -> U256 {
        self.state.read().nonce
    }

    pub fn max_calls(&self) -> usize {
        self.state.read().max_calls
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    /// True once a proxy upgrade replaced this implementation.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Stops this implementation from accepting mutating calls.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
        warn!(escrow = %self.address, "[ev-03] implementation retired");
    }

    /// Which gates currently block execution.
    pub fn operational_status(&self) -> OperationalStatus {
        let gate = &self.deps.gate;
        OperationalStatus {
            paused: self.is_paused(),
            global_emergency: gate.global_pause_active(),
            execute_paused: gate.is_function_paused(selectors::execute()),
            multicall_paused: gate.is_function_paused(selectors::multicall()),
            signatures_paused: gate.is_function_paused(selectors::execute_with_signatures()),
        }
    }

    /// Native balance plus the balance of every listed token.
    pub fn balance_snapshot(&self, tokens: &[Address]) -> BalanceSnapshot {
        let chain = &self.deps.chain;
        BalanceSnapshot {
            escrow: self.address,
            native: chain.native_balance(self.address),
            tokens: tokens
                .iter()
                .map(|token| (*token, chain.token_balance(*token, self.address)))
                .collect(),
        }
    }

    /// The payload approvers must sign for a call at the current nonce.
    pub fn execution_payload(
        &self,
        target: Address,
        value: U256,
        data: &[u8],
        deadline: Timestamp,
    ) -> ExecutionPayload {
        let state = self.state.read();
        ExecutionPayload::new(
            self.address,
            state.ownership.owner(),
            self.deps.chain.chain_id(),
            target,
            value,
            data,
            state.nonce,
            deadline,
        )
    }

    /// Digest approvers sign (before the personal-message envelope).
    pub fn message_hash(
        &self,
        target: Address,
        value: U256,
        data: &[u8],
        deadline: Timestamp,
    ) -> Hash {
        self.execution_payload(target, value, data, deadline).digest()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Runs `body` all-or-nothing.
    fn transact<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&mut Vec<EscrowEventKind>) -> Result<T, EscrowError>,
    ) -> Result<T, EscrowError> {
        let chain = &self.deps.chain;
        let journal = chain.journal();
        let _serial = journal.serialize();
        if self.is_retired() {
            return Err(EscrowError::Retired(self.address));
        }

        let saved = self.state.read().clone();
        let snapshot = chain.snapshot();
        journal.begin();

        let mut emitted = Vec::new();
        let outcome = body(&mut emitted).and_then(|value| {
            chain.discard(snapshot)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                let state = Arc::clone(&self.state);
                let undo: Effect = Box::new(move || *state.write() = saved);
                let publish = (!emitted.is_empty()).then(|| {
                    let sink = Arc::clone(&self.deps.events);
                    let escrow = self.address;
                    Box::new(move || {
                        for kind in emitted {
                            sink.publish(EscrowEvent { escrow, kind });
                        }
                    }) as Effect
                });
                journal.commit(Some(undo), publish);
                Ok(value)
            }
            Err(err) => {
                journal.rollback();
                *self.state.write() = saved;
                if let Err(chain_err) = chain.revert_to(snapshot) {
                    error!(
                        escrow = %self.address,
                        operation,
                        error = %chain_err,
                        "[ev-03] ledger rollback failed"
                    );
                    return Err(EscrowError::RollbackFailed(chain_err));
                }
                warn!(escrow = %self.address, operation, error = %err, "[ev-03] call rejected");
                Err(err)
            }
        }
    }

    fn ensure_owner(&self, caller: Address) -> Result<Address, EscrowError> {
        let state = self.state.read();
        state.ownership.ensure_owner(caller)?;
        Ok(state.ownership.owner())
    }

    fn ensure_no_emergency(&self, selector: Selector) -> Result<(), EscrowError> {
        if self.deps.gate.global_pause_active() {
            return Err(EscrowError::GlobalEmergencyActive);
        }
        if self.deps.gate.is_function_paused(selector) {
            return Err(EscrowError::FunctionPaused(selector));
        }
        Ok(())
    }

    fn ensure_operational(&self, paused: bool, selector: Selector) -> Result<(), EscrowError> {
        if paused {
            return Err(EscrowError::EscrowPaused);
        }
        self.ensure_no_emergency(selector)
    }

    fn ensure_can_deposit(&self, sender: Address, signature: &str) -> Result<(), EscrowError> {
        let paused = self.is_paused();
        self.ensure_operational(paused, Selector::from_signature(signature))?;
        if !self.deps.gate.is_live_mode() && !self.deps.whitelist.is_allowed(sender, self.address)
        {
            return Err(EscrowError::DepositorNotWhitelisted(sender));
        }
        Ok(())
    }

    fn ensure_target(&self, target: Address) -> Result<(), EscrowError> {
        if target.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        if !self.deps.whitelist.is_allowed(target, self.address) {
            return Err(EscrowError::TargetNotWhitelisted(target));
        }
        Ok(())
    }

    /// Contract recipients must be whitelisted or be the owner.
    fn ensure_recipient(&self, to: Address, owner: Address) -> Result<(), EscrowError> {
        if to.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        if to == self.address {
            return Err(EscrowError::RecipientNotAllowed(to));
        }
        if self.deps.chain.is_contract(to)
            && to != owner
            && !self.deps.whitelist.is_allowed(to, self.address)
        {
            return Err(EscrowError::RecipientNotAllowed(to));
        }
        Ok(())
    }

    fn receive_value(&self, ctx: &CallContext) -> Result<(), EscrowError> {
        if !ctx.value.is_zero() {
            self.deps
                .chain
                .transfer_native(ctx.sender, self.address, ctx.value)?;
        }
        Ok(())
    }

    fn pull_token(&self, from: Address, token: Address, amount: U256) -> Result<U256, EscrowError> {
        if token.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(EscrowError::ZeroAmount);
        }
        let chain = &self.deps.chain;
        let before = chain.token_balance(token, self.address);
        chain.transfer_token_from(token, self.address, from, self.address, amount)?;
        Ok(chain.token_balance(token, self.address).saturating_sub(before))
    }

    fn invoke(&self, target: Address, value: U256, data: Bytes) -> Result<Bytes, EscrowError> {
        self.deps
            .chain
            .call(CallRequest {
                from: self.address,
                to: target,
                value,
                data,
            })
            .map_err(|err| match err {
                ChainError::CallReverted(reason) => EscrowError::ExecutionFailed(reason),
                other => EscrowError::Chain(other),
            })
    }

    /// Recovers every signer and checks membership and uniqueness.
    fn authenticate(
        &self,
        payload: &ExecutionPayload,
        signatures: &[Vec<u8>],
        threshold: usize,
    ) -> Result<Vec<Address>, EscrowError> {
        let recovered = self
            .deps
            .verifier
            .recover_signers(&payload.digest(), signatures);

        let state = self.state.read();
        let mut seen = HashSet::with_capacity(recovered.len());
        let mut signers = Vec::with_capacity(recovered.len());

        for result in recovered {
            let signer = result.map_err(|err| {
                SIGNATURE_REJECTIONS.with_label_values(&[err.reason()]).inc();
                EscrowError::InvalidSignature(err)
            })?;
            if !state.approvers.contains(&signer) {
                SIGNATURE_REJECTIONS.with_label_values(&["not_approver"]).inc();
                return Err(EscrowError::NotApprover(signer));
            }
            if !seen.insert(signer) {
                SIGNATURE_REJECTIONS.with_label_values(&["duplicate_signer"]).inc();
                return Err(EscrowError::DuplicateSigner(signer));
            }
            signers.push(signer);
        }

        if signers.len() < threshold {
            return Err(EscrowError::ThresholdNotMet {
                valid: signers.len(),
                threshold,
            });
        }
        Ok(signers)
    }
}

fn check_max_calls(max_calls: usize, config: &EscrowConfig) -> Result<(), EscrowError> {
    if max_calls == 0 || max_calls > config.max_calls_hard_cap {
        return Err(EscrowError::InvalidMaxCalls(max_calls));
    }
    Ok(())
}

fn to_usize(value: u64) -> Result<usize, EscrowError> {
    usize::try_from(value).map_err(|_| EscrowError::CorruptStorage(format!("{value} overflows usize")))
}
