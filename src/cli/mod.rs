//! Command-line interface for tiercache.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigError, ConfigHelper, read_config};
use crate::logging::init_tracing;

pub use args::{GlobalArgs, InputSource, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A request failed in a way no reply could describe.
    #[error("{0}")]
    Cache(#[from] crate::common::Error),

    /// Malformed line in a command script.
    #[error("line {line}: {message}")]
    Script { line: u32, message: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// tiercache - A two-tier cache request orchestrator.
#[derive(Parser, Debug)]
#[command(name = "tiercache", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command script through an L1/L2 orchestrator over in-memory tiers.
    Replay(commands::replay::ReplayArgs),

    /// List every counter the orchestrator maintains.
    Counters(commands::counters::CountersArgs),
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let result = read_config(&self.global.to_config_source())?;

        let level = self
            .global
            .log_level
            .as_deref()
            .unwrap_or(&result.config.log.level);
        init_tracing(level);
        for warning in &result.warnings {
            warn!("{}", warning);
        }

        let helper = ConfigHelper::new(result.config);
        match self.command {
            Command::Replay(args) => args.run(&helper, &self.global).await,
            Command::Counters(args) => args.run(&self.global).await,
        }
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}
