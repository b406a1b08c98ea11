//! # Circuit Breaker Service
//!
//! Owns every pause dimension plus the deposit mode. Mutations are gated on
//! the owner or emergency admin, except the forced clears which anyone may
//! call once a pause has expired.

use crate::domain::errors::CircuitBreakerError;
use crate::domain::selectors;
use crate::domain::state::{PauseScope, PauseState};
use crate::events::GateEvent;
use crate::ports::inbound::EmergencyStatus;
use ev_telemetry::EMERGENCY_PAUSES;
use parking_lot::RwLock;
use shared_types::{Address, EventSink, NullEventSink, Selector, TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
struct GateState {
    owner: Address,
    emergency_admin: Option<Address>,
    live_mode: bool,
    global: PauseState,
    functions: HashMap<Selector, PauseState>,
}

impl GateState {
    fn scope(&self, scope: PauseScope) -> PauseState {
        match scope {
            PauseScope::Global => self.global,
            PauseScope::Function(selector) => {
                self.functions.get(&selector).copied().unwrap_or_default()
            }
        }
    }

    fn set_scope(&mut self, scope: PauseScope, state: PauseState) {
        match scope {
            PauseScope::Global => self.global = state,
            PauseScope::Function(selector) => match state {
                PauseState::Active => {
                    self.functions.remove(&selector);
                }
                paused => {
                    self.functions.insert(selector, paused);
                }
            },
        }
    }

    fn is_authorized(&self, caller: Address) -> bool {
        caller == self.owner || Some(caller) == self.emergency_admin
    }
}

/// Network-wide emergency gate.
pub struct CircuitBreaker {
    state: RwLock<GateState>,
    time: Arc<dyn TimeSource>,
    events: Arc<dyn EventSink<GateEvent>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a gate in dev mode with nothing paused.
    pub fn new(owner: Address, time: Arc<dyn TimeSource>) -> Self {
        Self::with_events(owner, time, Arc::new(NullEventSink))
    }

    /// Creates a gate publishing its transitions to `events`.
    pub fn with_events(
        owner: Address,
        time: Arc<dyn TimeSource>,
        events: Arc<dyn EventSink<GateEvent>>,
    ) -> Self {
        Self {
            state: RwLock::new(GateState {
                owner,
                emergency_admin: None,
                live_mode: false,
                global: PauseState::Active,
                functions: HashMap::new(),
            }),
            time,
            events,
        }
    }

    // =========================================================================
    // GLOBAL PAUSE
    // =========================================================================

    /// Pauses every escrow.
    pub fn activate_global_pause(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        self.pause(caller, PauseScope::Global)
    }

    /// Lifts the global pause.
    pub fn deactivate_global_pause(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        self.unpause(caller, PauseScope::Global)
    }

    /// Lifts an expired global pause. Callable by anyone.
    pub fn clear_expired_global_pause(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        self.clear_expired(caller, PauseScope::Global)
    }

    // =========================================================================
    // FUNCTION PAUSE
    // =========================================================================

    /// Pauses one entry point across every escrow.
    pub fn pause_function(
        &self,
        caller: Address,
        selector: Selector,
    ) -> Result<(), CircuitBreakerError> {
        self.pause(caller, PauseScope::Function(selector))
    }

    /// Lifts a function pause.
    pub fn unpause_function(
        &self,
        caller: Address,
        selector: Selector,
    ) -> Result<(), CircuitBreakerError> {
        self.unpause(caller, PauseScope::Function(selector))
    }

    /// Lifts an expired function pause. Callable by anyone.
    pub fn clear_expired_function_pause(
        &self,
        caller: Address,
        selector: Selector,
    ) -> Result<(), CircuitBreakerError> {
        self.clear_expired(caller, PauseScope::Function(selector))
    }

    /// Pauses `execute`, `multicall` and `executeWithSignatures` in one step.
    ///
    /// Selectors that are already paused keep their original start time.
    /// Fails with `AlreadyPaused` only if all three were already paused.
    pub fn pause_critical_functions(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        let now = self.time.now();
        let mut emitted = Vec::new();
        {
            let mut state = self.state.write();
            Self::ensure_authorized(&state, caller)?;

            for selector in selectors::critical() {
                let scope = PauseScope::Function(selector);
                if !state.scope(scope).is_paused() {
                    state.set_scope(scope, PauseState::Paused { since: now });
                    emitted.push(GateEvent::Paused {
                        scope,
                        by: caller,
                        at: now,
                    });
                }
            }
        }

        if emitted.is_empty() {
            return Err(CircuitBreakerError::AlreadyPaused);
        }

        warn!(
            by = %caller,
            count = emitted.len(),
            "[ev-02] critical functions paused"
        );
        for event in emitted {
            EMERGENCY_PAUSES.with_label_values(&["function"]).inc();
            self.events.publish(event);
        }
        Ok(())
    }

    /// Unpauses the critical selectors in one step.
    pub fn unpause_critical_functions(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        let mut emitted = Vec::new();
        {
            let mut state = self.state.write();
            Self::ensure_authorized(&state, caller)?;

            for selector in selectors::critical() {
                let scope = PauseScope::Function(selector);
                if state.scope(scope).is_paused() {
                    state.set_scope(scope, PauseState::Active);
                    emitted.push(GateEvent::Unpaused {
                        scope,
                        by: caller,
                        forced: false,
                    });
                }
            }
        }

        if emitted.is_empty() {
            return Err(CircuitBreakerError::NotPaused);
        }

        info!(by = %caller, "[ev-02] critical functions unpaused");
        for event in emitted {
            self.events.publish(event);
        }
        Ok(())
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Opens deposits to every sender. One-way.
    pub fn enable_live_mode(&self, caller: Address) -> Result<(), CircuitBreakerError> {
        {
            let mut state = self.state.write();
            Self::ensure_owner(&state, caller)?;
            if state.live_mode {
                return Err(CircuitBreakerError::LiveModeAlreadyEnabled);
            }
            state.live_mode = true;
        }
        info!(by = %caller, "[ev-02] live mode enabled");
        self.events.publish(GateEvent::LiveModeEnabled { by: caller });
        Ok(())
    }

    /// Sets or clears the emergency admin. Owner-only.
    pub fn set_emergency_admin(
        &self,
        caller: Address,
        admin: Option<Address>,
    ) -> Result<(), CircuitBreakerError> {
        if admin.is_some_and(|a| a.is_zero()) {
            return Err(CircuitBreakerError::ZeroAddress);
        }
        let previous = {
            let mut state = self.state.write();
            Self::ensure_owner(&state, caller)?;
            std::mem::replace(&mut state.emergency_admin, admin)
        };
        info!(admin = ?admin, "[ev-02] emergency admin changed");
        self.events.publish(GateEvent::EmergencyAdminChanged {
            previous,
            current: admin,
        });
        Ok(())
    }

    /// Hands the gate to a new owner. Owner-only.
    pub fn transfer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), CircuitBreakerError> {
        if new_owner.is_zero() {
            return Err(CircuitBreakerError::ZeroAddress);
        }
        let previous = {
            let mut state = self.state.write();
            Self::ensure_owner(&state, caller)?;
            std::mem::replace(&mut state.owner, new_owner)
        };
        info!(previous = %previous, current = %new_owner, "[ev-02] gate ownership transferred");
        self.events.publish(GateEvent::OwnershipTransferred {
            previous,
            current: new_owner,
        });
        Ok(())
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.state.read().owner
    }

    /// Current emergency admin.
    pub fn emergency_admin(&self) -> Option<Address> {
        self.state.read().emergency_admin
    }

    /// State of one pause dimension.
    pub fn pause_state(&self, scope: PauseScope) -> PauseState {
        self.state.read().scope(scope)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn ensure_owner(state: &GateState, caller: Address) -> Result<(), CircuitBreakerError> {
        if caller != state.owner {
            warn!(caller = %caller, "[ev-02] owner-only operation refused");
            return Err(CircuitBreakerError::NotAuthorized(caller));
        }
        Ok(())
    }

    fn ensure_authorized(state: &GateState, caller: Address) -> Result<(), CircuitBreakerError> {
        if !state.is_authorized(caller) {
            warn!(caller = %caller, "[ev-02] pause operation refused");
            return Err(CircuitBreakerError::NotAuthorized(caller));
        }
        Ok(())
    }

    fn pause(&self, caller: Address, scope: PauseScope) -> Result<(), CircuitBreakerError> {
        let now = self.time.now();
        {
            let mut state = self.state.write();
            Self::ensure_authorized(&state, caller)?;
            if state.scope(scope).is_paused() {
                return Err(CircuitBreakerError::AlreadyPaused);
            }
            state.set_scope(scope, PauseState::Paused { since: now });
        }

        warn!(scope = ?scope, by = %caller, at = now, "[ev-02] pause activated");
        EMERGENCY_PAUSES.with_label_values(&[scope.label()]).inc();
        self.events.publish(GateEvent::Paused {
            scope,
            by: caller,
            at: now,
        });
        Ok(())
    }

    fn unpause(&self, caller: Address, scope: PauseScope) -> Result<(), CircuitBreakerError> {
        {
            let mut state = self.state.write();
            Self::ensure_authorized(&state, caller)?;
            if !state.scope(scope).is_paused() {
                return Err(CircuitBreakerError::NotPaused);
            }
            state.set_scope(scope, PauseState::Active);
        }

        info!(scope = ?scope, by = %caller, "[ev-02] pause lifted");
        self.events.publish(GateEvent::Unpaused {
            scope,
            by: caller,
            forced: false,
        });
        Ok(())
    }

    fn clear_expired(&self, caller: Address, scope: PauseScope) -> Result<(), CircuitBreakerError> {
        let now = self.time.now();
        {
            let mut state = self.state.write();
            let current = state.scope(scope);
            let expires_at = current.expires_at().ok_or(CircuitBreakerError::NotPaused)?;
            if now < expires_at {
                return Err(CircuitBreakerError::PauseNotExpired { expires_at, now });
            }
            state.set_scope(scope, PauseState::Active);
        }

        info!(scope = ?scope, by = %caller, "[ev-02] expired pause cleared");
        self.events.publish(GateEvent::Unpaused {
            scope,
            by: caller,
            forced: true,
        });
        Ok(())
    }
}

impl EmergencyStatus for CircuitBreaker {
    fn global_pause_active(&self) -> bool {
        self.state.read().global.is_paused()
    }

    fn is_function_paused(&self, selector: Selector) -> bool {
        self.state.read().scope(PauseScope::Function(selector)).is_paused()
    }

    fn is_live_mode(&self) -> bool {
        self.state.read().live_mode
    }

    fn pause_expires_at(&self, scope: PauseScope) -> Option<Timestamp> {
        self.state.read().scope(scope).expires_at()
    }
}
