//! # Domain Errors
//!
//! Every error aborts the triggering call; no partial effect survives.

use ev_01_signature_verification::SignatureError;
use shared_types::{Address, Selector, Timestamp, U256};
use thiserror::Error;

/// Coarse classification callers use to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller (or a signer) lacks the required role.
    Authorization,
    /// Arguments are malformed or violate an invariant.
    Validation,
    /// The escrow or the network is in a state that forbids the call.
    State,
    /// An outbound call or transfer failed.
    Execution,
}

/// Failures reported by the chain adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("insufficient balance for {account:?}: required {required}, available {available}")]
    InsufficientBalance {
        account: Address,
        required: U256,
        available: U256,
    },

    #[error("insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("{0:?} does not own the token")]
    NotTokenOwner(Address),

    #[error("call reverted: {0}")]
    CallReverted(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("unknown snapshot {0}")]
    UnknownSnapshot(usize),
}

/// Escrow error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscrowError {
    // =========================================================================
    // AUTHORIZATION
    // =========================================================================
    #[error("{0:?} is not the escrow owner")]
    NotOwner(Address),

    #[error("{0:?} is not the pending owner")]
    NotPendingOwner(Address),

    #[error("signer {0:?} is not an approver")]
    NotApprover(Address),

    #[error("depositor {0:?} is not whitelisted")]
    DepositorNotWhitelisted(Address),

    #[error("target {0:?} is not whitelisted")]
    TargetNotWhitelisted(Address),

    #[error("recipient {0:?} is neither whitelisted nor the owner")]
    RecipientNotAllowed(Address),

    #[error("{0:?} is not the proxy admin")]
    NotProxyAdmin(Address),

    // =========================================================================
    // VALIDATION
    // =========================================================================
    #[error("zero address")]
    ZeroAddress,

    #[error("zero amount")]
    ZeroAmount,

    #[error("duplicate approver {0:?}")]
    DuplicateApprover(Address),

    #[error("duplicate signer {0:?}")]
    DuplicateSigner(Address),

    #[error("{0:?} is not an approver")]
    NotAnApprover(Address),

    #[error("threshold {threshold} out of range for {approvers} approvers")]
    ThresholdOutOfRange { threshold: usize, approvers: usize },

    #[error("approver limit of {max} reached")]
    TooManyApprovers { max: usize },

    #[error("removal would leave {remaining} approvers for threshold {threshold}")]
    WouldBreakThreshold { remaining: usize, threshold: usize },

    #[error("array length mismatch")]
    ArrayLengthMismatch,

    #[error("empty batch")]
    EmptyBatch,

    #[error("{count} calls exceed the limit of {max}")]
    TooManyCalls { count: usize, max: usize },

    #[error("max calls {0} out of range")]
    InvalidMaxCalls(usize),

    #[error("multicall may not target the escrow itself")]
    SelfCallForbidden,

    #[error("value mismatch: declared {declared}, attached {attached}")]
    ValueMismatch { declared: U256, attached: U256 },

    #[error("{provided} signatures supplied, threshold is {threshold}")]
    InsufficientSignatures { provided: usize, threshold: usize },

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("no deposit token configured")]
    NoDepositToken,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // STATE
    // =========================================================================
    #[error("escrow is paused")]
    EscrowPaused,

    #[error("escrow is not paused")]
    EscrowNotPaused,

    #[error("global emergency pause is active")]
    GlobalEmergencyActive,

    #[error("function {0} is paused")]
    FunctionPaused(Selector),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("deadline {deadline} expired at {now}")]
    DeadlineExpired { deadline: Timestamp, now: Timestamp },

    #[error("only {valid} valid approver signatures, threshold is {threshold}")]
    ThresholdNotMet { valid: usize, threshold: usize },

    #[error("no pending ownership transfer")]
    NoPendingOwnership,

    #[error("ownership transfer available at {available_at}")]
    OwnershipDelayNotElapsed { available_at: Timestamp },

    #[error("reentrant call")]
    ReentrantCall,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("not initialized")]
    NotInitialized,

    #[error("corrupt storage: {0}")]
    CorruptStorage(String),

    #[error("implementation {0:?} was replaced by an upgrade")]
    Retired(Address),

    // =========================================================================
    // EXECUTION
    // =========================================================================
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("sub-call {index} failed: {reason}")]
    SubCallFailed { index: usize, reason: String },

    #[error("transfer shortfall: received {received}, minimum {minimum}")]
    TransferShortfall { received: U256, minimum: U256 },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("ledger rollback failed: {0}")]
    RollbackFailed(ChainError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl EscrowError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        use EscrowError::*;
        match self {
            NotOwner(_)
            | NotPendingOwner(_)
            | NotApprover(_)
            | DepositorNotWhitelisted(_)
            | TargetNotWhitelisted(_)
            | RecipientNotAllowed(_)
            | NotProxyAdmin(_) => ErrorKind::Authorization,

            ZeroAddress
            | ZeroAmount
            | DuplicateApprover(_)
            | DuplicateSigner(_)
            | NotAnApprover(_)
            | ThresholdOutOfRange { .. }
            | TooManyApprovers { .. }
            | WouldBreakThreshold { .. }
            | ArrayLengthMismatch
            | EmptyBatch
            | TooManyCalls { .. }
            | InvalidMaxCalls(_)
            | SelfCallForbidden
            | ValueMismatch { .. }
            | InsufficientSignatures { .. }
            | InvalidSignature(_)
            | NoDepositToken
            | InvalidConfig(_) => ErrorKind::Validation,

            EscrowPaused
            | EscrowNotPaused
            | GlobalEmergencyActive
            | FunctionPaused(_)
            | InsufficientBalance { .. }
            | NothingToWithdraw
            | DeadlineExpired { .. }
            | ThresholdNotMet { .. }
            | NoPendingOwnership
            | OwnershipDelayNotElapsed { .. }
            | ReentrantCall
            | AlreadyInitialized
            | NotInitialized
            | CorruptStorage(_)
            | Retired(_) => ErrorKind::State,

            ExecutionFailed(_)
            | SubCallFailed { .. }
            | TransferShortfall { .. }
            | Overflow
            | RollbackFailed(_)
            | Chain(_) => ErrorKind::Execution,
        }
    }

    /// True when resubmitting later (or with fresh signatures) can succeed
    /// without any change of roles or arguments.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EscrowError::DeadlineExpired { .. }
                | EscrowError::EscrowPaused
                | EscrowError::GlobalEmergencyActive
                | EscrowError::FunctionPaused(_)
                | EscrowError::ReentrantCall
                | EscrowError::OwnershipDelayNotElapsed { .. }
                | EscrowError::InsufficientBalance { .. }
        )
    }
}
