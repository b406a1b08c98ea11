//! # Domain Errors

use shared_types::{Address, Timestamp};
use thiserror::Error;

/// Circuit breaker error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CircuitBreakerError {
    /// Caller is neither the owner nor the emergency admin.
    #[error("Caller {0:?} is not authorized to operate the emergency gate")]
    NotAuthorized(Address),

    /// Pause requested on a dimension that is already paused.
    #[error("Already paused")]
    AlreadyPaused,

    /// Unpause requested on a dimension that is active.
    #[error("Not paused")]
    NotPaused,

    /// Forced clear attempted before the pause expired.
    #[error("Pause has not expired yet (expires at {expires_at}, now {now})")]
    PauseNotExpired {
        /// Unix time at which anyone may clear the pause
        expires_at: Timestamp,
        /// Current unix time
        now: Timestamp,
    },

    /// Live mode is a one-way switch.
    #[error("Live mode already enabled")]
    LiveModeAlreadyEnabled,

    /// Zero address supplied where an account is required.
    #[error("Zero address")]
    ZeroAddress,
}
