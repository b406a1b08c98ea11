//! # Shared Types Crate
//!
//! Value objects and cross-cutting ports shared by every escrow subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Address`, `Hash`, `Selector` and `U256`
//!   are defined once and used by all crates.
//! - **Injected Time**: no subsystem reads the wall clock directly; all of
//!   them receive a `TimeSource`.
//! - **Committed Events Only**: audit events flow through `EventSink<E>`
//!   after the triggering operation succeeded.

pub mod entities;
pub mod events;
pub mod time;

pub use entities::*;
pub use events::{EventSink, InMemoryEventLog, NullEventSink};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};

/// Seconds in one day.
pub const DAY: u64 = 24 * 60 * 60;
