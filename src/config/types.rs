//! Configuration types for tiercache-rs.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

// =============================================================================
// Primitive Types
// =============================================================================

/// A byte size that can be parsed from strings like "100MB", "1GB", etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

/// Represents a limit that can be inherited, disabled, or set.
///
/// - `Inherit`: Not specified in config; inherit from the `[tiers]` section
/// - `Disabled`: Explicitly set to "none"; no limit applies
/// - `Value(T)`: Specific limit value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit<T> {
    Inherit,
    Disabled,
    Value(T),
}

// =============================================================================
// Config Sections
// =============================================================================

/// [log] section - diagnostic output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default `tracing` filter, used when `RUST_LOG` is not set.
    pub level: String,
}

/// Limits that apply to a single tier.
#[derive(Debug, Clone)]
pub struct TierLimits {
    pub max_value_size: Limit<ByteSize>,
}

impl TierLimits {
    /// Limits that defer everything to the parent section.
    pub fn inherit() -> Self {
        Self {
            max_value_size: Limit::Inherit,
        }
    }
}

/// [tiers] section - defaults for both tiers.
#[derive(Debug, Clone)]
pub struct TiersConfig {
    pub limits: TierLimits,
}

/// [l1] or [l2] section - a single tier.
#[derive(Debug, Clone)]
pub struct TierConfig {
    pub limits: TierLimits,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub tiers: TiersConfig,
    pub l1: TierConfig,
    pub l2: TierConfig,
}
