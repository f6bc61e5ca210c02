//! Terminal UI.

use console::Term;
use std::io::{self, IsTerminal, Write};

use crate::error::Result;

use super::prompts::read_continue_line;
use super::{should_use_colors, wait_for_enter, OutputMode, RunbookTheme, UserInterface};

/// Terminal UI implementation.
///
/// Progress goes to stdout; warnings and errors to stderr.
pub struct TerminalUI {
    term: Term,
    err_term: Term,
    theme: RunbookTheme,
    mode: OutputMode,
    interactive: bool,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode, interactive: bool, colors: bool) -> Self {
        let theme = if colors {
            RunbookTheme::new()
        } else {
            RunbookTheme::plain()
        };

        Self {
            term: Term::stdout(),
            err_term: Term::stderr(),
            theme,
            mode,
            interactive,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_progress() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err_term, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err_term, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_output(&mut self, output: &str) {
        if self.mode.shows_command_output() {
            writeln!(self.term, "{}", self.theme.command.apply_to(output)).ok();
        }
    }

    fn wait_for_continue(&mut self, prompt: &str) -> Result<()> {
        if !self.interactive {
            tracing::debug!("non-interactive, not waiting at pause");
            return Ok(());
        }
        if io::stdin().is_terminal() && self.term.is_term() {
            wait_for_enter(prompt, &self.term)
        } else {
            read_continue_line(prompt, &mut io::stdin().lock(), &mut self.term)
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Create the UI for this invocation.
///
/// Pause waits unless `interactive` is false. Without a terminal on stdin
/// it reads one line from whatever stdin is.
pub fn create_ui(interactive: bool, mode: OutputMode, no_color: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode, interactive, should_use_colors(no_color)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet, false, false);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn non_interactive_continue_returns_immediately() {
        let mut ui = TerminalUI::new(OutputMode::Normal, false, false);
        assert!(!ui.is_interactive());
        ui.wait_for_continue("<<press enter to continue>>").unwrap();
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal, true);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_interactive_does_not_depend_on_a_terminal() {
        let ui = create_ui(true, OutputMode::Normal, true);
        assert!(ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Verbose, true);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
    }
}
