//! Runbook execution.
//!
//! [`RunbookRunner`] walks a runbook's directives in order against a fresh
//! [`SessionState`]. The first failing directive stops that runbook; the
//! transcript is flushed and closed either way. Batches of files are
//! independent: one file failing does not stop the next.

use super::clock::{Clock, SystemClock};
use super::dispatch::{dispatch, Dispatch};
use super::handlers::HandlerContext;
use super::state::SessionState;
use crate::config::{load_runbook, DirectiveKind, Inventory, Runbook};
use crate::error::{Result, RunbookError};
use crate::remote::Transport;
use crate::ui::UserInterface;
use std::path::{Path, PathBuf};

/// What a completed runbook did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Known directives executed.
    pub directives_run: usize,
    /// Names skipped because they are not directives.
    pub unknown_directives: Vec<String>,
    /// Every transcript opened, in order.
    pub log_files: Vec<PathBuf>,
}

/// Result of one runbook file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<RunReport>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// One-line failure description: `<file>:<line>: <directive> failed: <error>`
    /// for directive failures, `<file>: <error>` otherwise.
    pub fn failure_line(&self) -> Option<String> {
        let err = self.result.as_ref().err()?;
        Some(match err {
            RunbookError::DirectiveFailed {
                directive,
                line,
                source,
            } => format!(
                "{}:{}: {} failed: {}",
                self.path.display(),
                line,
                directive,
                source
            ),
            other => format!("{}: {}", self.path.display(), other),
        })
    }
}

/// Results for a batch of runbook files, in the order given.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Executes runbooks against an inventory through a transport.
pub struct RunbookRunner<'a> {
    inventory: &'a Inventory,
    transport: &'a dyn Transport,
    clock: Box<dyn Clock>,
}

impl<'a> RunbookRunner<'a> {
    pub fn new(inventory: &'a Inventory, transport: &'a dyn Transport) -> Self {
        Self {
            inventory,
            transport,
            clock: Box::new(SystemClock),
        }
    }

    /// Use `clock` for time placeholders and Sleep.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Execute every directive of `runbook` in order.
    ///
    /// # Errors
    ///
    /// Returns `DirectiveFailed` naming the first directive that failed. The
    /// transcript is closed before returning.
    pub fn run(&self, runbook: &Runbook, ui: &mut dyn UserInterface) -> Result<RunReport> {
        let mut state = SessionState::new();
        let mut report = RunReport::default();

        let outcome = self.run_directives(runbook, &mut state, &mut report, ui);
        let closed = state.close();
        outcome?;
        closed?;

        tracing::info!(
            runbook = %runbook.path.display(),
            directives = report.directives_run,
            skipped = report.unknown_directives.len(),
            "runbook complete"
        );
        Ok(report)
    }

    fn run_directives(
        &self,
        runbook: &Runbook,
        state: &mut SessionState,
        report: &mut RunReport,
        ui: &mut dyn UserInterface,
    ) -> Result<()> {
        for directive in &runbook.directives {
            let mut ctx = HandlerContext {
                inventory: self.inventory,
                transport: self.transport,
                clock: self.clock.as_ref(),
                ui: &mut *ui,
            };
            let outcome = dispatch(directive, state, &mut ctx).map_err(|source| {
                RunbookError::DirectiveFailed {
                    directive: directive.name.clone(),
                    line: directive.line,
                    source: Box::new(source),
                }
            })?;

            match outcome {
                Dispatch::Handled(kind) => {
                    report.directives_run += 1;
                    if kind == DirectiveKind::LogToFile {
                        if let Some(sink) = &state.log_sink {
                            report.log_files.push(sink.path().to_path_buf());
                        }
                    }
                }
                Dispatch::Unknown(name) => report.unknown_directives.push(name),
            }
        }
        Ok(())
    }

    /// Load and execute the runbook at `path`.
    pub fn run_file(&self, path: &Path, ui: &mut dyn UserInterface) -> Result<RunReport> {
        tracing::info!(runbook = %path.display(), "loading runbook");
        let runbook = load_runbook(path)?;
        self.run(&runbook, ui)
    }

    /// Execute each file in turn; a failing file does not stop the rest.
    pub fn run_files(&self, paths: &[PathBuf], ui: &mut dyn UserInterface) -> BatchReport {
        let mut batch = BatchReport::default();
        for path in paths {
            let result = self.run_file(path, ui);
            if let Err(err) = &result {
                tracing::error!(runbook = %path.display(), kind = err.kind(), error = %err, "runbook failed");
            }
            batch.outcomes.push(FileOutcome {
                path: path.clone(),
                result,
            });
        }
        batch
    }
}
