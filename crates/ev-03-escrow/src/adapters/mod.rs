//! # Adapters Layer
//!
//! In-memory implementations of the outbound ports, used by tests and
//! simulations, and the proxy deployment adapter.

pub mod memory_chain;
pub mod proxy;

pub use memory_chain::{CallHandler, InMemoryChain};
pub use proxy::EscrowProxy;
