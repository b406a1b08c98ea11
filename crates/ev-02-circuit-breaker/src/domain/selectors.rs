//! Canonical signatures of the escrow entry points the gate can pause.
//!
//! Per-function pauses are keyed by the 4-byte selector of these strings,
//! so an operator pausing `execute` off-chain and the escrow checking it
//! always agree on the key.

use shared_types::Selector;

pub const DEPOSIT_ETH: &str = "depositETH()";
pub const DEPOSIT_TOKEN: &str = "depositToken(address,uint256)";
pub const DEPOSIT: &str = "deposit(uint256)";
pub const EXECUTE: &str = "execute(address,uint256,bytes)";
pub const MULTICALL: &str = "multicall(address[],uint256[],bytes[])";
pub const EXECUTE_WITH_SIGNATURES: &str =
    "executeWithSignatures(address,uint256,bytes,bytes[],uint256)";
pub const ADD_APPROVER: &str = "addApprover(address)";
pub const REMOVE_APPROVER: &str = "removeApprover(address)";
pub const UPDATE_THRESHOLD: &str = "updateThreshold(uint256)";

/// Selector of `execute`.
pub fn execute() -> Selector {
    Selector::from_signature(EXECUTE)
}

/// Selector of `multicall`.
pub fn multicall() -> Selector {
    Selector::from_signature(MULTICALL)
}

/// Selector of `executeWithSignatures`.
pub fn execute_with_signatures() -> Selector {
    Selector::from_signature(EXECUTE_WITH_SIGNATURES)
}

/// The incident-response set paused and unpaused together.
pub fn critical() -> [Selector; 3] {
    [execute(), multicall(), execute_with_signatures()]
}
