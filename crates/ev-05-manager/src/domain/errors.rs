//! # Domain Errors

use ev_03_escrow::EscrowError;
use shared_types::Address;
use thiserror::Error;

/// Manager error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Caller {0:?} is not the manager owner")]
    NotOwner(Address),

    #[error("Bot {0:?} is not authorized")]
    NotAuthorizedBot(Address),

    #[error("Escrow {0:?} is not registered")]
    EscrowNotRegistered(Address),

    #[error("Escrow {escrow:?} is not owned by {user:?}")]
    NotEscrowOwner { escrow: Address, user: Address },

    #[error("Caller {caller:?} cannot manage bot permissions of {user:?}")]
    NotPermissionHolder { caller: Address, user: Address },

    #[error("User {user:?} has not granted bot {bot:?}")]
    BotPermissionNotGranted { user: Address, bot: Address },

    #[error("Bot nonce mismatch: expected {expected}, got {provided}")]
    NonceMismatch { expected: u64, provided: u64 },

    #[error("Batch of {size} exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Zero address")]
    ZeroAddress,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid manager configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Escrow(#[from] EscrowError),
}

impl ManagerError {
    /// Metric label for a failed bot execution.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::NotAuthorizedBot(_) | Self::BotPermissionNotGranted { .. } => "unauthorized",
            Self::NonceMismatch { .. } => "nonce_mismatch",
            Self::Escrow(_) => "escrow_rejected",
            _ => "failure",
        }
    }
}
