//! # EV-04 Factory
//!
//! Escrow creation and the platform-wide collaborators every escrow shares.
//!
//! **Subsystem ID:** 04
//!
//! ## Components
//!
//! - [`EscrowFactory`]: creates escrows (direct or behind a proxy), owns the
//!   emergency gate, injects the default bot approver
//! - [`Registry`]: one escrow per (user, pool), written only by authorized
//!   factories
//! - [`WhitelistManager`]: global and per-escrow allow entries, implements
//!   the escrow's `WhitelistStore` port
//! - [`EscrowDirectory`]: address to live escrow lookup for the manager
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EV_OWNERSHIP_DELAY_SECS` | `172800` | Escrow ownership transfer delay |
//! | `EV_DEFAULT_MAX_CALLS` | `10` | Default multicall limit |
//! | `EV_MIN_RECEIVED_BPS` | `9500` | Fee-on-transfer tolerance |
//! | `EV_DEPLOYMENT_MODE` | `direct` | `direct` or `proxy` |

#![warn(clippy::all)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod registry;
pub mod service;
pub mod whitelist;

pub use domain::config::{DeploymentMode, FactoryConfig};
pub use domain::entities::{CreatedEscrow, Deployment, EscrowRecord};
pub use domain::errors::{FactoryError, RegistryError, WhitelistError};
pub use events::FactoryEvent;
pub use ports::inbound::EscrowDirectory;
pub use registry::Registry;
pub use service::{EscrowFactory, FactoryDeps};
pub use whitelist::WhitelistManager;
