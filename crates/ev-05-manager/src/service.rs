//! # Escrow Manager
//!
//! Lets pre-authorized bots submit signed executions on behalf of users who
//! opted in, and aggregates balances across registered escrows.
//!
//! A bot call never replaces the escrow's own threshold check: the manager
//! only adds bot authorization, user opt-in and a per-user bot nonce in
//! front of `execute_with_signatures`.
//!
//! ## Bot Nonce
//!
//! The nonce is reserved before the escrow is called and released again if
//! the call fails, so a callee re-entering the manager with the same nonce
//! is rejected.

use crate::domain::config::ManagerConfig;
use crate::domain::entities::{BatchItem, BatchReport, TvlReport};
use crate::domain::errors::ManagerError;
use crate::events::ManagerEvent;
use ev_03_escrow::{BalanceSnapshot, Escrow, ExecutionRequest};
use ev_04_factory::EscrowDirectory;
use ev_telemetry::BOT_EXECUTIONS;
use parking_lot::RwLock;
use shared_types::{Address, Bytes, EventSink, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct ManagerState {
    bots: HashSet<Address>,
    permissions: HashMap<Address, HashSet<Address>>,
    nonces: HashMap<Address, u64>,
}

/// Bot execution and aggregation layer.
pub struct EscrowManager {
    owner: RwLock<Address>,
    config: ManagerConfig,
    directory: Arc<dyn EscrowDirectory>,
    state: RwLock<ManagerState>,
    events: Arc<dyn EventSink<ManagerEvent>>,
}

impl std::fmt::Debug for EscrowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowManager")
            .field("owner", &self.owner())
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl EscrowManager {
    pub fn new(
        owner: Address,
        config: ManagerConfig,
        directory: Arc<dyn EscrowDirectory>,
        events: Arc<dyn EventSink<ManagerEvent>>,
    ) -> Result<Self, ManagerError> {
        config.validate()?;
        if owner.is_zero() {
            return Err(ManagerError::ZeroAddress);
        }
        Ok(Self {
            owner: RwLock::new(owner),
            config,
            directory,
            state: RwLock::new(ManagerState::default()),
            events,
        })
    }

    // =========================================================================
    // BOT ADMINISTRATION
    // =========================================================================

    pub fn authorize_bot(&self, caller: Address, bot: Address) -> Result<(), ManagerError> {
        self.ensure_owner(caller)?;
        if bot.is_zero() {
            return Err(ManagerError::ZeroAddress);
        }
        self.state.write().bots.insert(bot);
        info!(bot = %bot, "[ev-05] bot authorized");
        self.events.publish(ManagerEvent::BotAuthorized { bot });
        Ok(())
    }

    pub fn revoke_bot(&self, caller: Address, bot: Address) -> Result<(), ManagerError> {
        self.ensure_owner(caller)?;
        if !self.state.write().bots.remove(&bot) {
            return Err(ManagerError::NotAuthorizedBot(bot));
        }
        info!(bot = %bot, "[ev-05] bot revoked");
        self.events.publish(ManagerEvent::BotRevoked { bot });
        Ok(())
    }

    /// `user` opts in to executions by `bot`. Only `user` may call.
    pub fn grant_bot_permission(
        &self,
        caller: Address,
        user: Address,
        bot: Address,
    ) -> Result<(), ManagerError> {
        ensure_permission_holder(caller, user)?;
        if bot.is_zero() {
            return Err(ManagerError::ZeroAddress);
        }
        self.state
            .write()
            .permissions
            .entry(user)
            .or_default()
            .insert(bot);
        info!(user = %user, bot = %bot, "[ev-05] bot permission granted");
        self.events
            .publish(ManagerEvent::BotPermissionGranted { user, bot });
        Ok(())
    }

    pub fn revoke_bot_permission(
        &self,
        caller: Address,
        user: Address,
        bot: Address,
    ) -> Result<(), ManagerError> {
        ensure_permission_holder(caller, user)?;
        let removed = self
            .state
            .write()
            .permissions
            .get_mut(&user)
            .is_some_and(|bots| bots.remove(&bot));
        if !removed {
            return Err(ManagerError::BotPermissionNotGranted { user, bot });
        }
        info!(user = %user, bot = %bot, "[ev-05] bot permission revoked");
        self.events
            .publish(ManagerEvent::BotPermissionRevoked { user, bot });
        Ok(())
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), ManagerError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(ManagerError::ZeroAddress);
        }
        *self.owner.write() = new_owner;
        Ok(())
    }

    // =========================================================================
    // BOT EXECUTION
    // =========================================================================

    /// Forwards a signed request to `user`'s escrow on behalf of `bot`.
    ///
    /// Consumes one bot nonce of `user` on success only.
    pub fn execute_for_user(
        &self,
        bot: Address,
        user: Address,
        escrow: Address,
        request: &ExecutionRequest,
        expected_bot_nonce: u64,
    ) -> Result<Bytes, ManagerError> {
        let outcome = self.try_execute_for_user(bot, user, escrow, request, expected_bot_nonce);
        match &outcome {
            Ok(_) => BOT_EXECUTIONS.with_label_values(&["success"]).inc(),
            Err(err) => {
                BOT_EXECUTIONS
                    .with_label_values(&[err.outcome_label()])
                    .inc();
                warn!(bot = %bot, user = %user, escrow = %escrow, error = %err, "[ev-05] bot execution rejected");
            }
        }
        outcome
    }

    /// Runs up to `max_batch_size` items independently.
    ///
    /// Fails as a whole only if the batch itself is malformed or the bot is
    /// not authorized; item failures are reported in the returned report.
    pub fn batch_execute(
        &self,
        bot: Address,
        items: &[BatchItem],
    ) -> Result<BatchReport, ManagerError> {
        self.ensure_bot(bot)?;
        if items.is_empty() {
            return Err(ManagerError::EmptyBatch);
        }
        if items.len() > self.config.max_batch_size {
            return Err(ManagerError::BatchTooLarge {
                size: items.len(),
                max: self.config.max_batch_size,
            });
        }

        let batch_id = Uuid::new_v4();
        let results = items
            .iter()
            .map(|item| {
                self.execute_for_user(bot, item.user, item.escrow, &item.request, item.bot_nonce)
            })
            .collect();
        let report = BatchReport { batch_id, results };

        info!(
            batch_id = %batch_id,
            bot = %bot,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "[ev-05] batch executed"
        );
        self.events.publish(ManagerEvent::BatchExecuted {
            batch_id,
            bot,
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
        Ok(report)
    }

    // =========================================================================
    // AGGREGATION
    // =========================================================================

    /// Balance snapshot of each listed escrow, in input order.
    pub fn batch_balances(
        &self,
        escrows: &[Address],
        tokens: &[Address],
    ) -> Result<Vec<BalanceSnapshot>, ManagerError> {
        escrows
            .iter()
            .map(|address| {
                self.registered_escrow(*address)
                    .map(|escrow| escrow.balance_snapshot(tokens))
            })
            .collect()
    }

    /// Sums native and token balances over every registered escrow this
    /// manager can resolve.
    pub fn total_value_locked(&self, tokens: &[Address]) -> Result<TvlReport, ManagerError> {
        let mut report = TvlReport {
            escrows: 0,
            native: U256::zero(),
            tokens: tokens.iter().map(|t| (*t, U256::zero())).collect(),
        };

        for address in self.directory.all_escrows() {
            let Some(escrow) = self.directory.resolve(address) else {
                debug!(escrow = %address, "[ev-05] escrow not resolvable, skipped");
                continue;
            };
            let snapshot = escrow.balance_snapshot(tokens);
            report.native = report
                .native
                .checked_add(snapshot.native)
                .ok_or(ManagerError::Overflow)?;
            for ((_, total), (_, balance)) in report.tokens.iter_mut().zip(&snapshot.tokens) {
                *total = total.checked_add(*balance).ok_or(ManagerError::Overflow)?;
            }
            report.escrows += 1;
        }
        Ok(report)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    pub fn owner(&self) -> Address {
        *self.owner.read()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn is_authorized_bot(&self, bot: Address) -> bool {
        self.state.read().bots.contains(&bot)
    }

    pub fn has_bot_permission(&self, user: Address, bot: Address) -> bool {
        self.state
            .read()
            .permissions
            .get(&user)
            .is_some_and(|bots| bots.contains(&bot))
    }

    /// Next bot nonce `user` expects. Starts at 0.
    pub fn bot_nonce(&self, user: Address) -> u64 {
        self.state.read().nonces.get(&user).copied().unwrap_or(0)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn try_execute_for_user(
        &self,
        bot: Address,
        user: Address,
        escrow_address: Address,
        request: &ExecutionRequest,
        expected_bot_nonce: u64,
    ) -> Result<Bytes, ManagerError> {
        self.ensure_bot(bot)?;
        let escrow = self.registered_escrow(escrow_address)?;
        if escrow.owner() != user {
            return Err(ManagerError::NotEscrowOwner {
                escrow: escrow_address,
                user,
            });
        }

        self.reserve_nonce(user, bot, expected_bot_nonce)?;

        match escrow.execute_with_signatures(bot, request) {
            Ok(result) => {
                info!(
                    bot = %bot,
                    user = %user,
                    escrow = %escrow_address,
                    bot_nonce = expected_bot_nonce,
                    "[ev-05] bot execution"
                );
                self.events.publish(ManagerEvent::BotExecuted {
                    bot,
                    user,
                    escrow: escrow_address,
                    bot_nonce: expected_bot_nonce,
                });
                Ok(result)
            }
            Err(err) => {
                self.release_nonce(user, expected_bot_nonce);
                Err(err.into())
            }
        }
    }

    /// Checks permission and nonce and advances the nonce in one step.
    fn reserve_nonce(&self, user: Address, bot: Address, expected: u64) -> Result<(), ManagerError> {
        let mut state = self.state.write();
        let permitted = state
            .permissions
            .get(&user)
            .is_some_and(|bots| bots.contains(&bot));
        if !permitted {
            return Err(ManagerError::BotPermissionNotGranted { user, bot });
        }

        let nonce = state.nonces.entry(user).or_insert(0);
        if *nonce != expected {
            return Err(ManagerError::NonceMismatch {
                expected: *nonce,
                provided: expected,
            });
        }
        *nonce = nonce.checked_add(1).ok_or(ManagerError::Overflow)?;
        Ok(())
    }

    fn release_nonce(&self, user: Address, reserved: u64) {
        let mut state = self.state.write();
        if let Some(nonce) = state.nonces.get_mut(&user) {
            if *nonce == reserved + 1 {
                *nonce = reserved;
            }
        }
    }

    fn registered_escrow(&self, address: Address) -> Result<Arc<Escrow>, ManagerError> {
        if !self.directory.is_registered(address) {
            return Err(ManagerError::EscrowNotRegistered(address));
        }
        self.directory
            .resolve(address)
            .ok_or(ManagerError::EscrowNotRegistered(address))
    }

    fn ensure_bot(&self, bot: Address) -> Result<(), ManagerError> {
        if !self.is_authorized_bot(bot) {
            return Err(ManagerError::NotAuthorizedBot(bot));
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), ManagerError> {
        if caller != self.owner() {
            return Err(ManagerError::NotOwner(caller));
        }
        Ok(())
    }
}

/// Bot permissions belong to the user; nobody else grants or revokes them.
fn ensure_permission_holder(caller: Address, user: Address) -> Result<(), ManagerError> {
    if caller != user {
        return Err(ManagerError::NotPermissionHolder { caller, user });
    }
    Ok(())
}
