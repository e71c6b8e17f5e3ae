//! CLI subcommands.

pub mod counters;
pub mod replay;
