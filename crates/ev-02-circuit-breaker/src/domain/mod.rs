//! # Domain Layer
//!
//! Pause state machines and gated selectors.

pub mod errors;
pub mod selectors;
pub mod state;
