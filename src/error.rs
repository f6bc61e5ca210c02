//! Error types for runbook operations.
//!
//! This module defines [`RunbookError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Unknown directives are never errors; they are warned about and skipped
//! - Every other error aborts the current runbook file after its log sink is closed
//! - Errors raised while executing a directive are wrapped in
//!   [`RunbookError::DirectiveFailed`] so the report names the directive and line
//! - Use `anyhow::Error` (via `RunbookError::Other`) for foreign transport errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which part of connection establishment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    /// Opening a session straight to the device (or to a jumphost's own address).
    Direct,
    /// Opening the jumphost or issuing the connect command through it.
    Jumphost,
    /// Waiting for the target's password prompt on the jumphost channel.
    PasswordWait,
}

impl fmt::Display for ConnectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectPhase::Direct => "direct",
            ConnectPhase::Jumphost => "jumphost",
            ConnectPhase::PasswordWait => "password-wait",
        };
        write!(f, "{}", s)
    }
}

/// Core error type for runbook operations.
#[derive(Debug, Error)]
pub enum RunbookError {
    /// Inventory or runbook file not found at expected location.
    #[error("File not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse an inventory or runbook file.
    #[error("Failed to parse {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Bad inventory entry or runbook shape.
    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    /// ConnectTo named a device that is not in the inventory.
    #[error("Host not in inventory: {device}")]
    UnknownDevice { device: String },

    /// Transport, authentication, or jumphost handshake failure.
    #[error("Connection to '{device}' failed during {phase} phase: {message}")]
    ConnectionError {
        device: String,
        phase: ConnectPhase,
        message: String,
    },

    /// A directive ran without the connection, log sink, or device family it needs.
    #[error("Precondition failed: {message}")]
    PreconditionError { message: String },

    /// A template placeholder could not be resolved.
    #[error("Cannot expand '{template}': {message}")]
    ExpansionError { template: String, message: String },

    /// A directive failed; carries where it sits in the runbook.
    #[error("{directive} (line {line}) failed: {source}")]
    DirectiveFailed {
        directive: String,
        line: usize,
        #[source]
        source: Box<RunbookError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunbookError {
    /// Shorthand for a precondition failure.
    pub fn precondition(message: impl Into<String>) -> Self {
        RunbookError::PreconditionError {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration failure.
    pub fn configuration(message: impl Into<String>) -> Self {
        RunbookError::ConfigurationError {
            message: message.into(),
        }
    }

    /// Shorthand for a connection failure in a given phase.
    pub fn connection(
        device: impl Into<String>,
        phase: ConnectPhase,
        message: impl fmt::Display,
    ) -> Self {
        RunbookError::ConnectionError {
            device: device.into(),
            phase,
            message: message.to_string(),
        }
    }

    /// Stable label for the error kind, used when reporting failures.
    pub fn kind(&self) -> &'static str {
        match self {
            RunbookError::ConfigNotFound { .. }
            | RunbookError::ConfigParseError { .. }
            | RunbookError::ConfigurationError { .. }
            | RunbookError::UnknownDevice { .. } => "configuration",
            RunbookError::ConnectionError { .. } => "connection",
            RunbookError::PreconditionError { .. } => "precondition",
            RunbookError::ExpansionError { .. } => "expansion",
            RunbookError::DirectiveFailed { source, .. } => source.kind(),
            RunbookError::Io(_) => "io",
            RunbookError::Other(_) => "other",
        }
    }

    /// The innermost error, skipping directive location wrappers.
    pub fn root(&self) -> &RunbookError {
        match self {
            RunbookError::DirectiveFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for runbook operations.
pub type Result<T> = std::result::Result<T, RunbookError>;
