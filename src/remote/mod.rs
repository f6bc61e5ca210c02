//! Remote device sessions.
//!
//! The engine never talks to a terminal directly. It drives a
//! [`RemoteSession`] opened by a [`Transport`]:
//!
//! - [`resolver`] - reach a device directly or through one jumphost
//! - [`pty`] - real transport driving `ssh`/`telnet` under a pseudo-terminal
//! - [`mock`] - scripted transport for tests
//!
//! # Example
//!
//! ```
//! use netrunbook::config::{Inventory, InventoryEntry};
//! use netrunbook::remote::mock::MockTransport;
//! use netrunbook::remote::resolver::connect;
//!
//! let inventory = Inventory::from_entries(vec![(
//!     "r1".to_string(),
//!     InventoryEntry::new("alcatel_sros", "10.0.0.1").with_credentials("admin", "admin"),
//! )])
//! .unwrap();
//! let transport = MockTransport::new().with_prompt("alcatel_sros", "A:r1#");
//!
//! let connection = connect("r1", &inventory, &transport, |_| {}).unwrap();
//! assert_eq!(connection.prompt, "A:r1#");
//! assert_eq!(connection.device.hostname, "r1");
//! ```

pub mod mock;
pub mod pty;
pub mod resolver;

pub use crate::error::ConnectPhase;
pub use mock::{MockCall, MockTransport};
pub use pty::PtyTransport;
pub use resolver::{connect, Connection, ConnectProgress, PASSWORD_PROMPT};

use crate::config::InventoryEntry;
use crate::error::{Result, RunbookError};
use std::fmt;
use std::time::Duration;

/// Default seconds to wait for an expected pattern.
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

/// Default seconds allowed for the login exchange.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// The connection parameters a transport is allowed to see.
///
/// Built from an inventory entry by copying only the whitelisted fields;
/// jumphost settings and site-specific keys never reach the transport.
#[derive(Clone, PartialEq)]
pub struct ConnectParams {
    pub device_type: String,
    pub ip: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub global_delay_factor: Option<f64>,
    pub timeout: Option<u64>,
    pub session_timeout: Option<u64>,
}

impl ConnectParams {
    /// Copy the whitelisted fields out of an inventory entry.
    pub fn from_entry(entry: &InventoryEntry) -> Self {
        Self {
            device_type: entry.device_type.clone(),
            ip: entry.ip.clone(),
            username: entry.username.clone(),
            password: entry.password.clone(),
            port: entry.port,
            global_delay_factor: entry.global_delay_factor,
            timeout: entry.timeout,
            session_timeout: entry.session_timeout,
        }
    }

    fn delay_factor(&self) -> f64 {
        match self.global_delay_factor {
            Some(factor) if factor.is_finite() && factor > 0.0 => factor,
            _ => 1.0,
        }
    }

    /// How long to wait for a pattern, scaled by the delay factor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the scaled value does not fit a
    /// `Duration`.
    pub fn pattern_timeout(&self) -> Result<Duration> {
        self.scaled("timeout", self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// How long the login exchange may take, scaled by the delay factor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the scaled value does not fit a
    /// `Duration`.
    pub fn login_timeout(&self) -> Result<Duration> {
        self.scaled(
            "session_timeout",
            self.session_timeout.unwrap_or(DEFAULT_SESSION_TIMEOUT_SECS),
        )
    }

    fn scaled(&self, field: &str, secs: u64) -> Result<Duration> {
        let scaled = secs as f64 * self.delay_factor();
        Duration::try_from_secs_f64(scaled).map_err(|_| {
            RunbookError::configuration(format!(
                "{} of {}s x global_delay_factor {} is out of range for '{}'",
                field,
                secs,
                self.delay_factor(),
                self.ip
            ))
        })
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("device_type", &self.device_type)
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("port", &self.port)
            .field("global_delay_factor", &self.global_delay_factor)
            .field("timeout", &self.timeout)
            .field("session_timeout", &self.session_timeout)
            .finish()
    }
}

/// How a command is sent and when its output ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Regex marking the end of output. `None` uses the session's prompt.
    pub expect_pattern: Option<String>,
    /// Drop the echoed command line from the returned output.
    pub strip_command: bool,
}

impl SendOptions {
    /// Keep the echoed command so the output reads like a terminal transcript.
    pub fn transcript() -> Self {
        Self::default()
    }

    /// Wait for `pattern` instead of the session prompt; keeps the echo.
    pub fn expecting(pattern: &str) -> Self {
        Self {
            expect_pattern: Some(pattern.to_string()),
            strip_command: false,
        }
    }

    pub fn stripped(mut self) -> Self {
        self.strip_command = true;
        self
    }
}

/// An open, interactive command-line session on a device.
pub trait RemoteSession {
    /// Device family whose prompt rules are currently in effect.
    fn device_type(&self) -> &str;

    /// Write text to the channel exactly as given (no newline added).
    fn write_raw(&mut self, data: &str) -> Result<()>;

    /// Read until the regex `pattern` matches; returns everything read.
    fn read_until(&mut self, pattern: &str) -> Result<String>;

    /// Send `command` followed by a newline and return its output, up to but
    /// not including the closing prompt.
    fn send_command(&mut self, command: &str, options: &SendOptions) -> Result<String>;

    /// Return the prompt currently shown by the device.
    fn find_prompt(&mut self) -> Result<String>;

    /// Switch prompt detection to another device family without touching
    /// the underlying channel.
    fn reinterpret_as(&mut self, device_type: &str) -> Result<()>;
}

/// Opens remote sessions.
pub trait Transport {
    /// Open and authenticate a session with the given parameters.
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn RemoteSession>>;
}
