//! Configuration helper for interpreting config values.
//!
//! The `ConfigHelper` wraps a `Config` and provides methods for interpreting
//! configuration values, such as resolving inherited limits.

use super::{ByteSize, Config, Limit, TierLimits};
use crate::handlers::MemoryHandlerConfig;

/// Which tier a setting is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierName {
    L1,
    L2,
}

/// Helper for interpreting configuration values.
///
/// Wraps a `Config` and provides methods for resolving inherited values
/// and computing effective limits.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    config: Config,
}

impl ConfigHelper {
    /// Create a new ConfigHelper wrapping the given config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn tier_limits(&self, tier: TierName) -> &TierLimits {
        match tier {
            TierName::L1 => &self.config.l1.limits,
            TierName::L2 => &self.config.l2.limits,
        }
    }

    /// The largest value a tier accepts, or `None` for unlimited.
    ///
    /// An unset tier limit inherits `[tiers]`. An unset `[tiers]` limit is
    /// unlimited.
    pub fn max_value_size(&self, tier: TierName) -> Option<u64> {
        resolve_limit(
            &self.tier_limits(tier).max_value_size,
            &self.config.tiers.limits.max_value_size,
        )
    }

    /// Settings for an in-memory tier.
    pub fn memory_handler_config(&self, tier: TierName) -> MemoryHandlerConfig {
        MemoryHandlerConfig {
            max_value_size: self.max_value_size(tier),
        }
    }
}

fn resolve_limit(specific: &Limit<ByteSize>, parent: &Limit<ByteSize>) -> Option<u64> {
    match specific {
        Limit::Value(size) => Some(size.0),
        Limit::Disabled => None,
        Limit::Inherit => match parent {
            Limit::Value(size) => Some(size.0),
            Limit::Disabled | Limit::Inherit => None,
        },
    }
}

impl From<Config> for ConfigHelper {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}
