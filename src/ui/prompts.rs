//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use std::io::{BufRead, Write};

use crate::error::{Result, RunbookError};

/// Prompt shown by the Pause directive.
pub const CONTINUE_PROMPT: &str = "<<press enter to continue>>";

/// Convert dialoguer errors to RunbookError.
fn map_dialoguer_err(e: dialoguer::Error) -> RunbookError {
    RunbookError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Show `prompt` and block until the operator presses enter. Anything typed
/// is discarded.
pub fn wait_for_enter(prompt: &str, term: &Term) -> Result<()> {
    let _: String = Input::with_theme(&prompt_theme())
        .with_prompt(prompt)
        .allow_empty(true)
        .report(false)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;
    Ok(())
}

/// Show `prompt` on `output` and consume one line of `input`.
///
/// Used when stdin is piped rather than a terminal. End of input counts as
/// the operator's answer.
pub fn read_continue_line<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        tracing::debug!("stdin closed at pause, continuing");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dialoguer_errors_become_io_errors() {
        let err = map_dialoguer_err(dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        )));
        assert!(matches!(err, RunbookError::Io(_)));
    }

    #[test]
    fn continue_prompt_text() {
        assert_eq!(CONTINUE_PROMPT, "<<press enter to continue>>");
    }

    #[test]
    fn piped_continue_consumes_exactly_one_line() {
        let mut input = Cursor::new("go\nnext answer\n");
        let mut output = Vec::new();
        read_continue_line(CONTINUE_PROMPT, &mut input, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "<<press enter to continue>>\n");
        let mut rest = String::new();
        input.read_line(&mut rest).unwrap();
        assert_eq!(rest, "next answer\n");
    }

    #[test]
    fn piped_continue_accepts_end_of_input() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        read_continue_line(CONTINUE_PROMPT, &mut input, &mut output).unwrap();
        assert!(!output.is_empty());
    }
}
