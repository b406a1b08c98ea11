//! # EV-05 Manager
//!
//! Optional indirection in front of escrows: authorized bots execute
//! threshold-signed requests for users who opted in, and read-only queries
//! aggregate balances across every registered escrow.
//!
//! **Subsystem ID:** 05
//!
//! ## Bot Execution Checks
//!
//! In order: authorized bot, registered escrow, escrow owned by the user,
//! user opt-in, bot nonce. The escrow then runs its own signature and
//! threshold verification.

#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod service;

pub use domain::config::{ManagerConfig, DEFAULT_MAX_BATCH_SIZE};
pub use domain::entities::{BatchItem, BatchReport, TvlReport};
pub use domain::errors::ManagerError;
pub use events::ManagerEvent;
pub use service::EscrowManager;
