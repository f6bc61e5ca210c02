//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::Result;
use crate::ui::UserInterface;

/// Exit code when runbooks were given but at least one failed.
pub const EXIT_FAILED: i32 = 1;

/// Exit code when nothing could run: bad usage or no usable inventory.
pub const EXIT_UNUSABLE: i32 = 2;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    inventory_path: PathBuf,
    connect_command: Option<String>,
}

impl CommandDispatcher {
    /// Create a new dispatcher reading devices from `inventory_path`.
    pub fn new(inventory_path: PathBuf) -> Self {
        Self {
            inventory_path,
            connect_command: None,
        }
    }

    /// Override the command used to open device sessions.
    pub fn with_connect_command(mut self, template: Option<String>) -> Self {
        self.connect_command = template;
        self
    }

    pub fn inventory_path(&self) -> &Path {
        &self.inventory_path
    }

    /// Dispatch and execute a command.
    ///
    /// Bare runbook arguments without a subcommand behave like `run`.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => self.run(args.clone(), ui),
            Some(Commands::Check(args)) => {
                let cmd = super::check::CheckCommand::new(&self.inventory_path, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None if cli.runbooks.is_empty() => {
                ui.error("USAGE: netrunbook [OPTIONS] <RUNBOOK>...");
                ui.message("  Executes device commands from runbook files");
                ui.message(&format!(
                    "  Using devices defined in {}",
                    self.inventory_path.display()
                ));
                Ok(CommandResult::failure(EXIT_UNUSABLE))
            }
            None => self.run(
                RunArgs {
                    runbooks: cli.runbooks.clone(),
                },
                ui,
            ),
        }
    }

    fn run(&self, args: RunArgs, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let cmd = super::run::RunCommand::new(&self.inventory_path, args)
            .with_connect_command(self.connect_command.clone());
        cmd.execute(ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(EXIT_FAILED);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn no_runbooks_prints_usage() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().join("hosts.yml"));
        let cli = Cli::parse_from(["netrunbook"]);
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_UNUSABLE);
        assert!(ui.has_error("USAGE"));
        assert!(ui.has_message("hosts.yml"));
    }

    #[test]
    fn bare_runbooks_run_and_missing_inventory_is_unusable() {
        let temp = TempDir::new().unwrap();
        let dispatcher = CommandDispatcher::new(temp.path().join("hosts.yml"));
        let cli = Cli::parse_from(["netrunbook", "rb.yml"]);
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_UNUSABLE);
        assert!(ui.has_error("hosts.yml"));
    }

    #[test]
    fn inventory_path_accessor() {
        let dispatcher = CommandDispatcher::new(PathBuf::from("lab.yml"));
        assert_eq!(dispatcher.inventory_path(), Path::new("lab.yml"));
    }
}
