//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::DEFAULT_INVENTORY;

/// netrunbook - Run YAML runbooks against network device CLIs.
#[derive(Debug, Parser)]
#[command(name = "netrunbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Device inventory file
    #[arg(
        short,
        long,
        global = true,
        env = "NETRUNBOOK_INVENTORY",
        default_value = DEFAULT_INVENTORY
    )]
    pub inventory: PathBuf,

    /// Command that opens a device session ({ip}, {port}, {username}, {device_type})
    #[arg(long, global = true, env = "NETRUNBOOK_CONNECT_COMMAND")]
    pub connect_command: Option<String>,

    /// Show device output as it arrives
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show warnings, errors, and results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Never wait at Pause directives
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Runbook files to execute (same as `netrunbook run`)
    #[arg(value_name = "RUNBOOK")]
    pub runbooks: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute runbooks in order (default if no command specified)
    Run(RunArgs),

    /// Validate inventory and runbooks without connecting
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Runbook files, executed in the order given
    #[arg(value_name = "RUNBOOK", required = true)]
    pub runbooks: Vec<PathBuf>,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Runbook files to validate
    #[arg(value_name = "RUNBOOK", required = true)]
    pub runbooks: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
