//! # Integration Tests
//!
//! Factory, escrow, circuit breaker and manager wired together the way a
//! deployment wires them.

pub mod lifecycle;
pub mod scenarios;
