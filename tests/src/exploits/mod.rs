//! # Exploit Simulations
//!
//! Each module replays a known attack class against a fully wired platform
//! and asserts that it fails without side effects.

pub mod emergency;
pub mod signatures;
