//! # Inbound Ports
//!
//! Read-only view of the gate. Escrows hold an `Arc<dyn EmergencyStatus>`
//! and never mutate the gate.

use crate::domain::state::PauseScope;
use shared_types::{Selector, Timestamp};

/// Emergency state as seen by escrows.
///
/// Views report the raw stored state: an expired but uncleared pause is
/// still reported as active until someone calls the forced clear.
pub trait EmergencyStatus: Send + Sync {
    /// True while the global emergency pause is set.
    fn global_pause_active(&self) -> bool;

    /// True while `selector` is paused network-wide.
    fn is_function_paused(&self, selector: Selector) -> bool;

    /// True once deposits are open to every sender.
    fn is_live_mode(&self) -> bool;

    /// When the pause in `scope` becomes clearable by anyone, if paused.
    fn pause_expires_at(&self, scope: PauseScope) -> Option<Timestamp>;
}
