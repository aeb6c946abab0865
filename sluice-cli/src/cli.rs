//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sluice CLI - resolve and validate database migrations
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version)]
#[command(about = "Sluice CLI - resolve and validate database migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./sluice.toml when present)
    #[arg(short, long, global = true, env = "SLUICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log resolution details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved migration plan
    Resolve(ResolveArgs),

    /// Check that migrations resolve without conflicts
    Validate(ValidateArgs),

    /// Display version information
    Version,
}

// =============================================================================
// Resolve Command
// =============================================================================

/// Arguments for the `resolve` command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Locations to scan, replacing the configured ones
    #[arg(short, long = "location", value_name = "LOCATION")]
    pub locations: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Plan output formats
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// JSON array of migrations
    Json,
}

// =============================================================================
// Validate Command
// =============================================================================

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Locations to scan, replacing the configured ones
    #[arg(short, long = "location", value_name = "LOCATION")]
    pub locations: Vec<String>,
}
