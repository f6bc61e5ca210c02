//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use netrunbook::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("logging to: out.txt");
//! ui.warning("Invalid Command: Reboot");
//!
//! assert!(ui.messages().contains(&"logging to: out.txt".to_string()));
//! assert!(ui.has_warning("Reboot"));
//! ```

use crate::error::{Result, RunbookError};

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    outputs: Vec<String>,
    continue_prompts: Vec<String>,
    refuse_continue: bool,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Make `wait_for_continue` fail as if stdin were closed.
    pub fn refuse_continue(&mut self) {
        self.refuse_continue = true;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Device output passed to `show_output`.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Prompts passed to `wait_for_continue`, in order.
    pub fn continue_prompts(&self) -> &[String] {
        &self.continue_prompts
    }

    /// Check whether a message containing `text` was shown.
    pub fn has_message(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.contains(text))
    }

    /// Check whether a warning containing `text` was shown.
    pub fn has_warning(&self, text: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(text))
    }

    /// Check whether an error containing `text` was shown.
    pub fn has_error(&self, text: &str) -> bool {
        self.errors.iter().any(|e| e.contains(text))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_output(&mut self, output: &str) {
        self.outputs.push(output.to_string());
    }

    fn wait_for_continue(&mut self, prompt: &str) -> Result<()> {
        self.continue_prompts.push(prompt.to_string());
        if self.refuse_continue {
            return Err(RunbookError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )));
        }
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}
