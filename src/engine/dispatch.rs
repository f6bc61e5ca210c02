//! Directive dispatch.

use super::handlers::{
    ConfigureHandler, ConnectToHandler, DirectiveHandler, ExecuteHandler, HandlerContext,
    LogToFileHandler, PauseHandler, PrintHandler, SleepHandler,
};
use super::state::SessionState;
use crate::config::{Directive, DirectiveKind};
use crate::error::Result;

/// What happened to a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A known directive ran to completion.
    Handled(DirectiveKind),
    /// The name is not a known directive; it was skipped with a warning.
    Unknown(String),
}

/// The handler for a directive kind.
pub fn handler_for(kind: DirectiveKind) -> &'static dyn DirectiveHandler {
    match kind {
        DirectiveKind::LogToFile => &LogToFileHandler,
        DirectiveKind::ConnectTo => &ConnectToHandler,
        DirectiveKind::Execute => &ExecuteHandler,
        DirectiveKind::Configure => &ConfigureHandler,
        DirectiveKind::Print => &PrintHandler,
        DirectiveKind::Pause => &PauseHandler,
        DirectiveKind::Sleep => &SleepHandler,
    }
}

/// Run one directive.
///
/// Unknown names are never errors: they are reported through the UI and
/// leave `state` untouched.
pub fn dispatch(
    directive: &Directive,
    state: &mut SessionState,
    ctx: &mut HandlerContext<'_>,
) -> Result<Dispatch> {
    match directive.kind() {
        Some(kind) => {
            tracing::debug!(directive = %directive.name, line = directive.line, "dispatching");
            handler_for(kind).handle(state, &directive.payload, ctx)?;
            Ok(Dispatch::Handled(kind))
        }
        None => {
            tracing::warn!(
                directive = %directive.name,
                line = directive.line,
                "invalid command, skipping"
            );
            ctx.ui
                .warning(&format!("Invalid Command: {}", directive.name));
            Ok(Dispatch::Unknown(directive.name.clone()))
        }
    }
}
