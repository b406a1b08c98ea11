//! # Domain Layer
//!
//! Escrow business rules with no I/O: the approver set, delayed ownership,
//! configuration, the reentrancy guard, the transaction journal and the
//! persisted storage layout.

pub mod approvers;
pub mod config;
pub mod entities;
pub mod errors;
pub mod guard;
pub mod journal;
pub mod ownership;
pub mod storage;
