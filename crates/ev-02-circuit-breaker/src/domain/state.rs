//! Pause state machine.
//!
//! ```text
//! [ACTIVE] ──pause (owner/admin)──→ [PAUSED {since}]
//!     ↑                                  │
//!     ├──── unpause (owner/admin) ───────┤
//!     └──── clear_expired (anyone, now ≥ since + 7d) ──┘
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{Selector, Timestamp, DAY};

/// Maximum lifetime of any pause before anyone may clear it.
pub const EMERGENCY_PAUSE_DURATION: u64 = 7 * DAY;

/// Which pause dimension an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauseScope {
    /// Every escrow, every gated operation.
    Global,
    /// One entry point across every escrow.
    Function(Selector),
}

impl PauseScope {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Function(_) => "function",
        }
    }
}

/// State of a single pause dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PauseState {
    #[default]
    Active,
    Paused {
        since: Timestamp,
    },
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Unix time at which anyone may clear the pause.
    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Self::Active => None,
            Self::Paused { since } => Some(since.saturating_add(EMERGENCY_PAUSE_DURATION)),
        }
    }

    /// True once the forced clear is allowed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }
}
