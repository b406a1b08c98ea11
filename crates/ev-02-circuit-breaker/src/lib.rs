//! # EV-02 Circuit Breaker
//!
//! Network-wide emergency gate consulted by every escrow.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Pause Dimensions
//!
//! | Dimension | Key | Authorized | Forced clear |
//! |-----------|-----|------------|--------------|
//! | Global | none | owner, emergency admin | anyone after 7 days |
//! | Function | 4-byte selector | owner, emergency admin | anyone after 7 days |
//!
//! Each dimension is an independent `Active -> Paused(since) -> Active`
//! state machine. The forced clear is a liveness backstop: a pause can never
//! outlive [`EMERGENCY_PAUSE_DURATION`] even if every admin key is lost.
//!
//! ## Deposit Mode
//!
//! The gate also carries the one-way dev/live switch. In dev mode only
//! whitelisted senders may deposit into escrows; live mode opens deposits to
//! everyone and cannot be reverted.
//!
//! ## Module Structure
//!
//! ```text
//! ev-02-circuit-breaker/
//! ├── domain/          # PauseState, selectors, errors
//! ├── ports/           # EmergencyStatus (read port for escrows)
//! ├── events.rs        # GateEvent
//! └── service.rs       # CircuitBreaker
//! ```

#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use domain::errors::CircuitBreakerError;
pub use domain::selectors;
pub use domain::state::{PauseScope, PauseState, EMERGENCY_PAUSE_DURATION};
pub use events::GateEvent;
pub use ports::inbound::EmergencyStatus;
pub use service::CircuitBreaker;
