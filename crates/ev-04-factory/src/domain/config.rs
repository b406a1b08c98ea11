//! Factory configuration.
//!
//! Every escrow created by a factory inherits these defaults.

use super::errors::FactoryError;
use ev_03_escrow::{EscrowConfig, MAX_APPROVERS, MAX_CALLS_HARD_CAP};
use serde::{Deserialize, Serialize};
use shared_types::{Address, DAY};
use std::env;
use std::fmt;
use std::str::FromStr;

/// How new escrows are deployed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentMode {
    /// A plain escrow instance.
    #[default]
    Direct,
    /// An escrow behind an upgradeable proxy administered by the factory.
    Proxy,
}

impl FromStr for DeploymentMode {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "proxy" => Ok(Self::Proxy),
            other => Err(FactoryError::InvalidConfig(format!(
                "unknown deployment mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

/// Factory-wide defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Delay before a proposed escrow owner may accept.
    pub default_ownership_delay_secs: u64,

    /// Multicall limit used when the creator does not pick one.
    pub default_max_calls: usize,

    /// Fee-on-transfer tolerance for token withdrawals.
    pub min_received_bps: u16,

    pub deployment_mode: DeploymentMode,

    /// Token pulled by the combined `deposit` entry point.
    pub deposit_token: Option<Address>,

    /// Approver appended to every new escrow when set.
    pub default_bot: Option<Address>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            default_ownership_delay_secs: 2 * DAY,
            default_max_calls: 10,
            min_received_bps: EscrowConfig::default().min_received_bps,
            deployment_mode: DeploymentMode::Direct,
            deposit_token: None,
            default_bot: None,
        }
    }
}

impl FactoryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `EV_OWNERSHIP_DELAY_SECS` (default: 172800)
    /// - `EV_DEFAULT_MAX_CALLS` (default: 10)
    /// - `EV_MIN_RECEIVED_BPS` (default: 9500)
    /// - `EV_DEPLOYMENT_MODE`: `direct` or `proxy` (default: direct)
    pub fn from_env() -> Result<Self, FactoryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FactoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            default_ownership_delay_secs: parse(&lookup, "EV_OWNERSHIP_DELAY_SECS")?
                .unwrap_or(defaults.default_ownership_delay_secs),
            default_max_calls: parse(&lookup, "EV_DEFAULT_MAX_CALLS")?
                .unwrap_or(defaults.default_max_calls),
            min_received_bps: parse(&lookup, "EV_MIN_RECEIVED_BPS")?
                .unwrap_or(defaults.min_received_bps),
            deployment_mode: parse(&lookup, "EV_DEPLOYMENT_MODE")?
                .unwrap_or(defaults.deployment_mode),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Escrow-level configuration derived from these defaults.
    pub fn escrow_config(&self) -> EscrowConfig {
        EscrowConfig {
            min_received_bps: self.min_received_bps,
            max_calls_hard_cap: MAX_CALLS_HARD_CAP,
            max_approvers: MAX_APPROVERS,
        }
    }

    pub fn validate(&self) -> Result<(), FactoryError> {
        self.escrow_config().validate()?;
        if self.default_max_calls == 0 || self.default_max_calls > MAX_CALLS_HARD_CAP {
            return Err(FactoryError::InvalidConfig(format!(
                "default_max_calls must be within 1..={MAX_CALLS_HARD_CAP}, got {}",
                self.default_max_calls
            )));
        }
        if self.deposit_token.is_some_and(|t| t.is_zero())
            || self.default_bot.is_some_and(|b| b.is_zero())
        {
            return Err(FactoryError::ZeroAddress);
        }
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, FactoryError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| FactoryError::InvalidConfig(format!("{key}: {e}")))
        })
        .transpose()
}
