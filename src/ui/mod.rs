//! User-facing output.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for terminal usage, interactive or not
//! - [`MockUI`] for tests
//!
//! Transcripts go to log files; this layer only carries progress lines,
//! warnings, failures, and the Pause prompt.
//!
//! # Example
//!
//! ```
//! use netrunbook::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("connecting to: r1");
//! ui.wait_for_continue("<<press enter to continue>>").unwrap();
//!
//! assert!(ui.has_message("connecting to: r1"));
//! assert_eq!(ui.continue_prompts().len(), 1);
//! ```

pub mod mock;
pub mod output;
pub mod prompts;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use prompts::{wait_for_enter, CONTINUE_PROMPT};
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, RunbookTheme};

use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a progress line.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Echo device output (verbose mode only).
    fn show_output(&mut self, output: &str);

    /// Block until the operator confirms. Returns immediately when not
    /// interactive.
    fn wait_for_continue(&mut self, prompt: &str) -> Result<()>;

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}
