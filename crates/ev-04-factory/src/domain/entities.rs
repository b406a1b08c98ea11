//! Registry and deployment records.

use super::config::DeploymentMode;
use ev_03_escrow::{Escrow, EscrowProxy};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp};
use std::sync::Arc;

/// Registry entry of one escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    pub escrow: Address,
    pub user: Address,
    pub pool: Address,
    /// Factory that registered the escrow.
    pub factory: Address,
}

/// Summary returned by `EscrowFactory::create_escrow`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEscrow {
    pub escrow: Address,
    pub user: Address,
    pub pool: Address,
    pub approvers: Vec<Address>,
    pub threshold: usize,
    pub mode: DeploymentMode,
    pub created_at: Timestamp,
}

/// A deployed escrow, held the way it was deployed.
#[derive(Clone, Debug)]
pub enum Deployment {
    Direct(Arc<Escrow>),
    Proxy(Arc<EscrowProxy>),
}

impl Deployment {
    /// The live implementation. `None` only for an uninitialized proxy.
    pub fn escrow(&self) -> Option<Arc<Escrow>> {
        match self {
            Self::Direct(escrow) => Some(escrow.clone()),
            Self::Proxy(proxy) => proxy.implementation().ok(),
        }
    }

    pub fn mode(&self) -> DeploymentMode {
        match self {
            Self::Direct(_) => DeploymentMode::Direct,
            Self::Proxy(_) => DeploymentMode::Proxy,
        }
    }
}
