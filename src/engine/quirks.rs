//! Device-family command quirks.
//!
//! Only the SR OS family is supported for Execute and Configure. A few SR OS
//! commands stop at a confirmation question instead of returning to the
//! prompt; those are answered here.

use crate::config::ConnectedDevice;
use crate::error::{Result, RunbookError};
use crate::remote::{RemoteSession, SendOptions};
use regex::Regex;
use std::sync::LazyLock;

/// The only device family Execute and Configure accept.
pub const SUPPORTED_FAMILY: &str = "alcatel_sros";

/// End-of-output pattern for Configure. SR OS sometimes shows `$` instead of
/// `#` after `configure ... create`.
pub const CONFIGURE_PROMPT: &str = r"\*?[A-Z]:\S+[#\$]";

/// Question SR OS asks before clearing application-assurance statistics.
pub const SROS_CONFIRM_PROMPT: &str =
    "Warning: This may result in statistics inconsistency. Proceed (y/n)?";

static CONFIRMING_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^clear application-assurance group \d+ statistics").unwrap()
});

/// Fail unless the connected device belongs to the supported family.
pub fn require_family(device: &ConnectedDevice, directive: &str) -> Result<()> {
    if device.device_type() == SUPPORTED_FAMILY {
        Ok(())
    } else {
        Err(RunbookError::precondition(format!(
            "{} currently only supports {}; '{}' is {}",
            directive,
            SUPPORTED_FAMILY,
            device.hostname,
            device.device_type()
        )))
    }
}

/// Whether `command` stops at a confirmation question.
pub fn needs_confirmation(command: &str) -> bool {
    CONFIRMING_COMMAND.is_match(command)
}

/// Send an SR OS command and return what should go into the transcript.
pub fn send_sros_command(session: &mut dyn RemoteSession, command: &str) -> Result<String> {
    if !needs_confirmation(command) {
        return session.send_command(command, &SendOptions::transcript());
    }

    tracing::debug!(command, "answering confirmation");
    session.write_raw(&format!("{}\n", command))?;
    let mut captured = session.read_until(&regex::escape(SROS_CONFIRM_PROMPT))?;
    session.write_raw("y")?;
    session.send_command("", &SendOptions::transcript())?;
    captured.push('\n');
    Ok(captured)
}
