//! # Domain Errors

use ev_02_circuit_breaker::CircuitBreakerError;
use ev_03_escrow::EscrowError;
use shared_types::Address;
use thiserror::Error;

/// Registry bookkeeping failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Caller {0:?} is not the registry owner")]
    NotOwner(Address),

    #[error("Factory {0:?} is not authorized to register escrows")]
    FactoryNotAuthorized(Address),

    /// One escrow per (user, pool).
    #[error("User {user:?} already has an escrow for pool {pool:?}")]
    EscrowAlreadyExists { user: Address, pool: Address },

    #[error("Escrow {0:?} is already registered")]
    AlreadyRegistered(Address),

    #[error("Zero address")]
    ZeroAddress,
}

/// Whitelist mutation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WhitelistError {
    #[error("Caller {0:?} is not the whitelist owner")]
    NotOwner(Address),

    #[error("Zero address")]
    ZeroAddress,

    #[error("Batch is empty")]
    EmptyBatch,
}

/// Factory failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Caller {0:?} is not the factory owner")]
    NotOwner(Address),

    #[error("User {user:?} already has an escrow for pool {pool:?}")]
    EscrowAlreadyExists { user: Address, pool: Address },

    #[error("Escrow {0:?} was not deployed by this factory")]
    UnknownEscrow(Address),

    #[error("Escrow {0:?} is not behind a proxy")]
    NotUpgradeable(Address),

    #[error("Zero address")]
    ZeroAddress,

    #[error("Invalid factory configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Escrow(#[from] EscrowError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Gate(#[from] CircuitBreakerError),
}
