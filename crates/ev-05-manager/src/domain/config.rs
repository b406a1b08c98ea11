//! Manager configuration.

use super::errors::ManagerError;
use serde::{Deserialize, Serialize};
use std::env;

/// Default upper bound on items per batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Maximum items accepted by `batch_execute`.
    pub max_batch_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ManagerConfig {
    /// Reads `EV_MAX_BATCH_SIZE` (default: 25).
    pub fn from_env() -> Result<Self, ManagerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ManagerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_batch_size = match lookup("EV_MAX_BATCH_SIZE") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ManagerError::InvalidConfig(format!("EV_MAX_BATCH_SIZE: {e}"))
            })?,
            None => DEFAULT_MAX_BATCH_SIZE,
        };
        let config = Self { max_batch_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ManagerError> {
        if self.max_batch_size == 0 {
            return Err(ManagerError::InvalidConfig(
                "max_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
