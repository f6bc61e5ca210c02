//! Run command implementation.
//!
//! The `netrunbook run` command loads the inventory once and executes each
//! runbook file in order. A failing runbook is reported and the next one
//! still runs.

use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::{load_inventory, Inventory};
use crate::engine::{BatchReport, RunbookRunner};
use crate::error::Result;
use crate::remote::{PtyTransport, Transport};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_FAILED, EXIT_UNUSABLE};

/// The run command implementation.
pub struct RunCommand {
    inventory_path: PathBuf,
    connect_command: Option<String>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(inventory_path: &Path, args: RunArgs) -> Self {
        Self {
            inventory_path: inventory_path.to_path_buf(),
            connect_command: None,
            args,
        }
    }

    /// Override the command used to open device sessions.
    pub fn with_connect_command(mut self, template: Option<String>) -> Self {
        self.connect_command = template;
        self
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Run every runbook through `transport` and report per file.
    pub fn run_with(
        &self,
        inventory: &Inventory,
        transport: &dyn Transport,
        ui: &mut dyn UserInterface,
    ) -> CommandResult {
        let runner = RunbookRunner::new(inventory, transport);
        let batch = runner.run_files(&self.args.runbooks, ui);
        report(&batch, ui);

        if batch.all_succeeded() {
            CommandResult::success()
        } else {
            CommandResult::failure(EXIT_FAILED)
        }
    }

    fn transport(&self) -> PtyTransport {
        match &self.connect_command {
            Some(template) => PtyTransport::new().with_connect_command(template.clone()),
            None => PtyTransport::new(),
        }
    }
}

fn report(batch: &BatchReport, ui: &mut dyn UserInterface) {
    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(summary) => {
                let mut line = format!(
                    "{}: {} directives",
                    outcome.path.display(),
                    summary.directives_run
                );
                if !summary.unknown_directives.is_empty() {
                    line.push_str(&format!(
                        ", {} skipped",
                        summary.unknown_directives.len()
                    ));
                }
                ui.success(&line);
            }
            Err(_) => {
                if let Some(line) = outcome.failure_line() {
                    ui.error(&line);
                }
            }
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let inventory = match load_inventory(&self.inventory_path) {
            Ok(inventory) => inventory,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(EXIT_UNUSABLE));
            }
        };
        for problem in inventory.validate() {
            ui.warning(&problem);
        }

        let transport = self.transport();
        Ok(self.run_with(&inventory, &transport, ui))
    }
}
