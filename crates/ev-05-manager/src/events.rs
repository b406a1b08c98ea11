//! Manager audit events.

use serde::{Deserialize, Serialize};
use shared_types::Address;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerEvent {
    BotAuthorized { bot: Address },
    BotRevoked { bot: Address },
    BotPermissionGranted { user: Address, bot: Address },
    BotPermissionRevoked { user: Address, bot: Address },
    BotExecuted {
        bot: Address,
        user: Address,
        escrow: Address,
        bot_nonce: u64,
    },
    BatchExecuted {
        batch_id: Uuid,
        bot: Address,
        succeeded: usize,
        failed: usize,
    },
}
