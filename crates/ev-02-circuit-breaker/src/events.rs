//! Gate audit events.

use crate::domain::state::PauseScope;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp};

/// Every gate transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateEvent {
    Paused {
        scope: PauseScope,
        by: Address,
        at: Timestamp,
    },
    /// `forced` is true when cleared through the expiry backstop.
    Unpaused {
        scope: PauseScope,
        by: Address,
        forced: bool,
    },
    LiveModeEnabled {
        by: Address,
    },
    EmergencyAdminChanged {
        previous: Option<Address>,
        current: Option<Address>,
    },
    OwnershipTransferred {
        previous: Address,
        current: Address,
    },
}
