//! Per-runbook session state.

use super::transcript::LogSink;
use crate::config::ConnectedDevice;
use crate::error::{Result, RunbookError};
use crate::remote::{Connection, RemoteSession};
use std::collections::HashMap;
use std::fmt;

/// Mutable state threaded through every directive of one runbook file.
///
/// Created empty for each file and dropped when the file finishes.
#[derive(Default)]
pub struct SessionState {
    /// Open device session; absent before the first `ConnectTo`.
    pub connection: Option<Box<dyn RemoteSession>>,
    /// Transcript destination; absent before the first `LogToFile`.
    pub log_sink: Option<LogSink>,
    /// Device currently connected to.
    pub connected_device: Option<ConnectedDevice>,
    /// Free-form values kept for the length of the run.
    pub named_captures: HashMap<String, String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The open transcript.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError` if no `LogToFile` has run yet.
    pub fn sink(&mut self) -> Result<&mut LogSink> {
        self.log_sink
            .as_mut()
            .ok_or_else(|| RunbookError::precondition("no log file open; add a LogToFile first"))
    }

    /// The open device session.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError` if no `ConnectTo` has run yet.
    pub fn connection_mut(&mut self) -> Result<&mut Box<dyn RemoteSession>> {
        self.connection
            .as_mut()
            .ok_or_else(|| RunbookError::precondition("not connected to any device"))
    }

    /// The connected device.
    ///
    /// # Errors
    ///
    /// Returns `PreconditionError` if no device is connected.
    pub fn require_device(&self) -> Result<&ConnectedDevice> {
        self.connected_device
            .as_ref()
            .ok_or_else(|| RunbookError::precondition("not connected to any device"))
    }

    /// Install a fresh connection. The previous session, if any, is dropped
    /// without a logout.
    pub fn attach(&mut self, connection: Connection) {
        if let Some(previous) = &self.connected_device {
            tracing::debug!(
                from = %previous.hostname,
                to = %connection.device.hostname,
                "replacing connection"
            );
        }
        self.connection = Some(connection.session);
        self.connected_device = Some(connection.device);
    }

    /// Switch the transcript to `sink`, closing the previous one.
    pub fn replace_sink(&mut self, sink: LogSink) -> Result<()> {
        if let Some(previous) = self.log_sink.replace(sink) {
            previous.close()?;
        }
        Ok(())
    }

    /// Read the current prompt and append it to the transcript.
    pub fn log_prompt(&mut self) -> Result<()> {
        let prompt = self.connection_mut()?.find_prompt()?;
        self.sink()?.write_prompt(&prompt)
    }

    /// Like [`SessionState::log_prompt`] but writes the prompt without a
    /// leading newline, for annotation blocks that already end one.
    pub fn log_prompt_inline(&mut self) -> Result<()> {
        let prompt = self.connection_mut()?.find_prompt()?;
        self.sink()?.write(&format!("{} ", prompt))
    }

    /// Flush and close the transcript and drop the connection.
    pub fn close(&mut self) -> Result<()> {
        self.connection = None;
        self.connected_device = None;
        match self.log_sink.take() {
            Some(sink) => sink.close(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("connected", &self.is_connected())
            .field("log_sink", &self.log_sink.as_ref().map(LogSink::path))
            .field(
                "connected_device",
                &self.connected_device.as_ref().map(|d| d.hostname.as_str()),
            )
            .field("named_captures", &self.named_captures)
            .finish()
    }
}
