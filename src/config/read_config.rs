//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::env;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

use super::{ByteSize, Config, Limit, LogConfig, TierConfig, TierLimits, TiersConfig};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_VALUE_SIZE: u64 = 1024 * 1024; // 1MB

const ENV_CONFIG_FILE: &str = "TIERCACHE_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".tiercache";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid byte size '{value}': {message}")]
    InvalidByteSize { value: String, message: String },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to TIERCACHE_CONFIG_FILE env var, then ~/.tiercache.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "log.level", "l1.max_value_size"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// ByteSize Parsing
// =============================================================================

impl ByteSize {
    /// Parse a byte size from a string like "100MB", "1GB", "500KB", or plain "1024".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "empty string".to_string(),
            });
        }

        let num_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        if num_end == 0 {
            return Err(ConfigError::InvalidByteSize {
                value: s.to_string(),
                message: "no numeric value".to_string(),
            });
        }

        let num_str = &s[..num_end];
        let suffix = s[num_end..].trim().to_uppercase();

        let base: u64 = num_str.parse().map_err(|e| ConfigError::InvalidByteSize {
            value: s.to_string(),
            message: format!("invalid number: {}", e),
        })?;

        let multiplier: u64 = match suffix.as_str() {
            "" | "B" => 1,
            "K" | "KB" => 1024,
            "M" | "MB" => 1024 * 1024,
            "G" | "GB" => 1024 * 1024 * 1024,
            "T" | "TB" => 1024 * 1024 * 1024 * 1024,
            _ => {
                return Err(ConfigError::InvalidByteSize {
                    value: s.to_string(),
                    message: format!("unknown suffix '{}'", suffix),
                });
            }
        };

        Ok(ByteSize(base.saturating_mul(multiplier)))
    }
}

// =============================================================================
// Value Parsing
// =============================================================================

/// Parse an optional byte size limit. Returns Inherit if the key is not present.
fn parse_limit_bytesize(ini: &Ini, section: &str, key: &str) -> Result<Limit<ByteSize>> {
    match ini.get(section, key) {
        None => Ok(Limit::Inherit),
        Some(v) => parse_limit_value_bytesize(&v),
    }
}

fn parse_limit_value_bytesize(value: &str) -> Result<Limit<ByteSize>> {
    if value.trim().eq_ignore_ascii_case("none") {
        Ok(Limit::Disabled)
    } else {
        Ok(Limit::Value(ByteSize::parse(value)?))
    }
}

/// Accept a bare level name or a full filter directive such as
/// "info,tiercache_rs=debug".
fn parse_log_level(value: &str) -> Result<String> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '=' | ',' | ':'));
    if valid {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidLogLevel(value.to_string()))
    }
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
pub struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    pub path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    pub warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    // If explicit path provided, it must exist
    if let Some(ref path) = source.config_file {
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            });
        } else {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
    }

    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        } else {
            // Warn but continue with defaults
            return Ok(ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "config file specified by {} does not exist: {}",
                    ENV_CONFIG_FILE, env_path
                )),
            });
        }
    }

    if let Some(home) = home_dir() {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        log: LogConfig {
            level: DEFAULT_LOG_LEVEL.to_string(),
        },
        tiers: TiersConfig {
            limits: TierLimits {
                max_value_size: Limit::Value(ByteSize(DEFAULT_MAX_VALUE_SIZE)),
            },
        },
        l1: TierConfig {
            limits: TierLimits::inherit(),
        },
        l2: TierConfig {
            limits: TierLimits::inherit(),
        },
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

fn parse_tier_limits(ini: &Ini, section: &str) -> Result<TierLimits> {
    Ok(TierLimits {
        max_value_size: parse_limit_bytesize(ini, section, "max_value_size")?,
    })
}

/// Apply limits from `from` to `to`, but only for non-Inherit values.
fn apply_limits_if_set(to: &mut TierLimits, from: &TierLimits) {
    if !matches!(from.max_value_size, Limit::Inherit) {
        to.max_value_size = from.max_value_size.clone();
    }
}

/// Apply an INI file's contents to a Config, layering on top of existing values.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    if let Some(level) = ini.get("log", "level") {
        config.log.level = parse_log_level(&level)?;
    }

    let tiers = parse_tier_limits(ini, "tiers")?;
    apply_limits_if_set(&mut config.tiers.limits, &tiers);

    let l1 = parse_tier_limits(ini, "l1")?;
    apply_limits_if_set(&mut config.l1.limits, &l1);

    let l2 = parse_tier_limits(ini, "l2")?;
    apply_limits_if_set(&mut config.l2.limits, &l2);

    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.splitn(2, '.').collect();

    match parts.as_slice() {
        ["log", "level"] => {
            config.log.level = parse_log_level(value)?;
            Ok(())
        }
        ["tiers", param] => apply_limit_override(&mut config.tiers.limits, "tiers", param, value),
        ["l1", param] => apply_limit_override(&mut config.l1.limits, "l1", param, value),
        ["l2", param] => apply_limit_override(&mut config.l2.limits, "l2", param, value),
        _ => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_limit_override(
    limits: &mut TierLimits,
    section: &str,
    param: &str,
    value: &str,
) -> Result<()> {
    match param {
        "max_value_size" => {
            limits.max_value_size = parse_limit_value_bytesize(value)?;
            Ok(())
        }
        _ => Err(ConfigError::InvalidOverrideKey {
            key: format!("{}.{}", section, param),
            message: "unknown parameter".to_string(),
        }),
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.tiercache)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================
