//! Factory audit events.

use crate::domain::config::DeploymentMode;
use serde::{Deserialize, Serialize};
use shared_types::Address;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryEvent {
    EscrowCreated {
        user: Address,
        pool: Address,
        escrow: Address,
        mode: DeploymentMode,
    },
    EscrowUpgraded {
        escrow: Address,
        revision: u32,
    },
    DefaultBotUpdated {
        previous: Option<Address>,
        current: Option<Address>,
    },
    OwnershipTransferred {
        previous: Address,
        current: Address,
    },
}
