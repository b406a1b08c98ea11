//! Lookup port consumed by the manager.

use ev_03_escrow::Escrow;
use shared_types::Address;
use std::sync::Arc;

/// Resolves registered escrow addresses to live instances.
pub trait EscrowDirectory: Send + Sync {
    /// The escrow deployed at `escrow`, if this directory knows it.
    fn resolve(&self, escrow: Address) -> Option<Arc<Escrow>>;

    /// True if `escrow` was registered through the platform registry.
    fn is_registered(&self, escrow: Address) -> bool;

    /// Every registered escrow, in registration order.
    fn all_escrows(&self) -> Vec<Address>;
}
