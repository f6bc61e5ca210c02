//! Directive handlers.
//!
//! Each known directive has a handler that validates its preconditions,
//! talks to the device, and appends to the transcript. Handlers never keep
//! state of their own; everything lives in [`SessionState`].

use super::clock::Clock;
use super::quirks::{self, CONFIGURE_PROMPT};
use super::state::SessionState;
use super::transcript::LogSink;
use crate::config::{expand, DirectiveKind, ExpansionContext, Inventory, Payload};
use crate::error::{Result, RunbookError};
use crate::remote::{connect, ConnectProgress, SendOptions, Transport};
use crate::ui::{UserInterface, CONTINUE_PROMPT};
use std::path::Path;
use std::time::Duration;

/// Collaborators a handler may use besides the session state.
pub struct HandlerContext<'a> {
    pub inventory: &'a Inventory,
    pub transport: &'a dyn Transport,
    pub clock: &'a dyn Clock,
    pub ui: &'a mut dyn UserInterface,
}

impl HandlerContext<'_> {
    /// Variables for expanding templates right now.
    pub fn expansion(&self, state: &SessionState) -> ExpansionContext {
        ExpansionContext::at(&self.clock.now()).with_device(state.connected_device.as_ref())
    }

    fn expand_all(&self, state: &SessionState, payload: &Payload) -> Result<Vec<String>> {
        let context = self.expansion(state);
        payload
            .items()
            .into_iter()
            .map(|line| expand(line, &context))
            .collect()
    }
}

/// Behaviour of one directive kind.
pub trait DirectiveHandler {
    fn kind(&self) -> DirectiveKind;

    /// Run the directive against the session.
    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()>;
}

/// Opens a new transcript file.
pub struct LogToFileHandler;

impl DirectiveHandler for LogToFileHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::LogToFile
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        let template = payload.single(self.kind().name())?;
        let filename = expand(template, &ctx.expansion(state))?;
        ctx.ui.message(&format!("logging to: {}", filename));

        state.replace_sink(LogSink::create(Path::new(&filename))?)?;
        if state.is_connected() {
            state.log_prompt()?;
        }
        Ok(())
    }
}

/// Connects to an inventory device, directly or through its jumphost.
pub struct ConnectToHandler;

impl DirectiveHandler for ConnectToHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::ConnectTo
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        let device_id = payload.single(self.kind().name())?;
        state.sink()?;

        let ui = &mut *ctx.ui;
        let connection = connect(device_id, ctx.inventory, ctx.transport, |event| {
            let line = match event {
                ConnectProgress::OpeningJumphost { jumphost } => {
                    format!("connecting to jumphost: {}", jumphost)
                }
                ConnectProgress::Opening { device } => format!("connecting to: {}", device),
                ConnectProgress::SendingPassword => "sending password".to_string(),
            };
            ui.message(&line);
        })?;

        let prompt = connection.prompt.clone();
        state.attach(connection);
        state.sink()?.write_prompt(&prompt)
    }
}

/// Runs show-style commands on an SR OS device.
pub struct ExecuteHandler;

impl DirectiveHandler for ExecuteHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::Execute
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        quirks::require_family(state.require_device()?, self.kind().name())?;
        state.sink()?;

        ctx.ui.message("executing:");
        for command in payload.items() {
            ctx.ui.message(&format!("\t\"{}\"", command));
            let output = quirks::send_sros_command(state.connection_mut()?.as_mut(), command)?;
            ctx.ui.show_output(&output);
            state.sink()?.write(&output)?;
            state.log_prompt()?;
        }
        Ok(())
    }
}

/// Runs commands that move between CLI contexts, then returns to the root.
pub struct ConfigureHandler;

impl DirectiveHandler for ConfigureHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::Configure
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        quirks::require_family(state.require_device()?, self.kind().name())?;
        state.sink()?;

        let options = SendOptions::expecting(CONFIGURE_PROMPT);
        ctx.ui.message("configuring:");
        for command in payload.items() {
            ctx.ui.message(&format!("\t\"{}\"", command));
            let output = state.connection_mut()?.send_command(command, &options)?;
            ctx.ui.show_output(&output);
            state.sink()?.write(&output)?;
            state.log_prompt()?;
        }

        state.connection_mut()?.send_command("exit all", &options)?;
        state.log_prompt()
    }
}

/// Writes comment lines into the transcript.
pub struct PrintHandler;

impl DirectiveHandler for PrintHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::Print
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        state.sink()?;
        let lines = ctx.expand_all(state, payload)?;

        state.sink()?.write("\n# \n")?;
        for line in &lines {
            ctx.ui.message(&format!("print \"{}\"", line));
            state.sink()?.write_comment(line)?;
        }
        if state.is_connected() {
            state.sink()?.write("# \n")?;
            state.log_prompt_inline()?;
        }
        Ok(())
    }
}

/// Records manual steps and waits for the operator.
pub struct PauseHandler;

impl DirectiveHandler for PauseHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::Pause
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        state.sink()?;
        let lines = ctx.expand_all(state, payload)?;

        state.sink()?.write("\n# Performing the following: \n")?;
        for line in &lines {
            ctx.ui.message(&format!("pause: \"{}\"", line));
            state.sink()?.write(&format!("#    {}\n", line))?;
        }
        state.sink()?.flush()?;
        ctx.ui.wait_for_continue(CONTINUE_PROMPT)?;

        state.sink()?.write("#\n")?;
        if state.is_connected() {
            state.log_prompt_inline()?;
        }
        Ok(())
    }
}

/// Waits a number of seconds per item.
pub struct SleepHandler;

impl DirectiveHandler for SleepHandler {
    fn kind(&self) -> DirectiveKind {
        DirectiveKind::Sleep
    }

    fn handle(
        &self,
        state: &mut SessionState,
        payload: &Payload,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<()> {
        state.sink()?;
        let waits = payload
            .items()
            .into_iter()
            .map(|item| parse_seconds(item).map(|duration| (item, duration)))
            .collect::<Result<Vec<_>>>()?;

        state.sink()?.write("\n#\n")?;
        for (item, duration) in waits {
            ctx.ui.message(&format!("sleeping for: {} seconds", item));
            ctx.clock.sleep(duration);
            state
                .sink()?
                .write(&format!("# Waited for approx.: {} seconds\n", item))?;
        }

        state.sink()?.write("#\n")?;
        if state.is_connected() {
            state.log_prompt_inline()?;
        }
        Ok(())
    }
}

/// Parse a Sleep item as a finite, non-negative number of seconds.
pub fn parse_seconds(item: &str) -> Result<Duration> {
    let invalid = || {
        RunbookError::precondition(format!(
            "Sleep needs a non-negative number of seconds, got '{}'",
            item
        ))
    };
    let secs: f64 = item.trim().parse().map_err(|_| invalid())?;
    if secs < 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}
