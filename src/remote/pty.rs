//! Pseudo-terminal transport.
//!
//! Spawns the system `ssh` (or `telnet` for `*_telnet` device types) under
//! a pty, answers the login prompts, and then drives the device CLI by
//! waiting for prompt regexes. Output is normalized to `\n` line endings.

use super::resolver::PASSWORD_PROMPT;
use super::{ConnectParams, RemoteSession, SendOptions, Transport};
use crate::config::{expand, ExpansionContext};
use crate::error::{ConnectPhase, Result, RunbookError};
use expectrl::{Regex, Session};
use std::collections::HashMap;
use std::io;
use std::thread;
use std::time::Duration;

/// Prompt of an SR OS CLI, e.g. `A:core-r1#` or `*A:core-r1>config>router# `.
pub const SROS_PROMPT: &str = r"\*?[A-Z]:\S+[#$]\s*$";

/// Fallback prompt for device families without a dedicated rule.
pub const GENERIC_PROMPT: &str = r"[\w@.\-:/~\[\]()]+\s?[>#$%]\s*$";

const LOGIN_PROMPT: &str = "ogin:";

/// Prompt regex for a device family.
pub fn prompt_pattern(device_type: &str) -> &'static str {
    if device_type.starts_with("alcatel_sros") || device_type.starts_with("nokia_sros") {
        SROS_PROMPT
    } else {
        GENERIC_PROMPT
    }
}

fn is_telnet(device_type: &str) -> bool {
    device_type.ends_with("_telnet")
}

/// Command used to open a session when no override is configured.
pub fn default_connect_template(params: &ConnectParams) -> &'static str {
    match (is_telnet(&params.device_type), params.username.is_some()) {
        (true, _) => "telnet {ip} {port}",
        (false, true) => "ssh -p {port} {username}@{ip}",
        (false, false) => "ssh -p {port} {ip}",
    }
}

/// Transport that drives the local `ssh`/`telnet` client.
#[derive(Debug, Clone, Default)]
pub struct PtyTransport {
    connect_command: Option<String>,
}

impl PtyTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the spawn command. The template may use `{ip}`, `{port}`,
    /// `{username}`, and `{device_type}`.
    pub fn with_connect_command(mut self, template: impl Into<String>) -> Self {
        self.connect_command = Some(template.into());
        self
    }

    /// Render the command that opens a session for `params`.
    pub fn spawn_command(&self, params: &ConnectParams) -> Result<String> {
        let default_port = if is_telnet(&params.device_type) { 23 } else { 22 };
        let mut vars = HashMap::new();
        vars.insert("ip".to_string(), params.ip.clone());
        vars.insert(
            "port".to_string(),
            params.port.unwrap_or(default_port).to_string(),
        );
        vars.insert("device_type".to_string(), params.device_type.clone());
        if let Some(username) = &params.username {
            vars.insert("username".to_string(), username.clone());
        }

        let template = self
            .connect_command
            .as_deref()
            .unwrap_or_else(|| default_connect_template(params));
        expand(template, &ExpansionContext::from_vars(vars))
    }
}

impl Transport for PtyTransport {
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn RemoteSession>> {
        let command = self.spawn_command(params)?;
        tracing::debug!(command = %command, params = ?params, "spawning session");

        let mut session = expectrl::spawn(&command).map_err(refused(&params.ip))?;
        session.set_expect_timeout(Some(params.login_timeout()?));

        if is_telnet(&params.device_type) {
            if let Some(username) = &params.username {
                session.expect(Regex(LOGIN_PROMPT)).map_err(refused(&params.ip))?;
                session.send_line(username.as_str()).map_err(refused(&params.ip))?;
            }
        }
        if let Some(password) = &params.password {
            session.expect(Regex(PASSWORD_PROMPT)).map_err(refused(&params.ip))?;
            session.send_line(password.as_str()).map_err(refused(&params.ip))?;
        }

        // Swallow the banner and first prompt so later reads start clean.
        session
            .expect(Regex(prompt_pattern(&params.device_type)))
            .map_err(refused(&params.ip))?;

        session.set_expect_timeout(Some(params.pattern_timeout()?));
        Ok(Box::new(PtySession::new(session, &params.device_type)))
    }
}

/// How long the channel must stay silent before pending output counts as drained.
const SETTLE: Duration = Duration::from_millis(50);

/// A live pty session with family-specific prompt detection.
pub struct PtySession {
    session: Session,
    device_type: String,
    prompt_pattern: &'static str,
}

impl PtySession {
    fn new(session: Session, device_type: &str) -> Self {
        Self {
            session,
            device_type: device_type.to_string(),
            prompt_pattern: prompt_pattern(device_type),
        }
    }

    /// Wait for `pattern`; returns (text before the match, the match).
    fn expect_text(&mut self, pattern: &str) -> Result<(String, String)> {
        let captures = self
            .session
            .expect(Regex(pattern))
            .map_err(|e| anyhow::anyhow!("waiting for /{}/: {}", pattern, e))?;
        let before = normalize(captures.before());
        let matched = captures.get(0).map(normalize).unwrap_or_default();
        Ok((before, matched))
    }

    fn send(&mut self, data: &str) -> Result<()> {
        self.session
            .send(data)
            .map_err(|e| anyhow::anyhow!("writing to channel: {}", e))?;
        Ok(())
    }

    /// Discard whatever the device printed that nobody asked for, such as a
    /// late banner or a prompt left over from a previous exchange.
    fn drain(&mut self) {
        let mut discarded = Vec::new();
        let mut buf = [0u8; 1024];
        let mut quiet = false;
        loop {
            match self.session.try_read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    discarded.extend_from_slice(&buf[..n]);
                    quiet = false;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if quiet {
                        break;
                    }
                    quiet = true;
                    thread::sleep(SETTLE);
                }
                Err(e) => {
                    // A dead channel shows up on the next write or expect.
                    tracing::debug!(error = %e, "channel read failed while draining");
                    break;
                }
            }
        }
        if !discarded.is_empty() {
            tracing::trace!(text = %normalize(&discarded), "discarded pending output");
        }
    }
}

impl RemoteSession for PtySession {
    fn device_type(&self) -> &str {
        &self.device_type
    }

    fn write_raw(&mut self, data: &str) -> Result<()> {
        self.send(data)
    }

    fn read_until(&mut self, pattern: &str) -> Result<String> {
        let (before, matched) = self.expect_text(pattern)?;
        Ok(before + &matched)
    }

    fn send_command(&mut self, command: &str, options: &SendOptions) -> Result<String> {
        self.drain();
        self.send(&format!("{}\n", command))?;
        if !command.is_empty() {
            // Output starts after the echoed command line.
            self.expect_text(&format!(r"{}\r?\n", regex::escape(command)))?;
        }

        let pattern = options
            .expect_pattern
            .as_deref()
            .unwrap_or(self.prompt_pattern)
            .to_string();
        let (before, _) = self.expect_text(&pattern)?;
        Ok(shape_output(command, &before, options.strip_command))
    }

    fn find_prompt(&mut self) -> Result<String> {
        self.drain();
        self.send("\n")?;
        let pattern = self.prompt_pattern;
        let (_, matched) = self.expect_text(pattern)?;
        Ok(matched.trim().to_string())
    }

    fn reinterpret_as(&mut self, device_type: &str) -> Result<()> {
        tracing::debug!(from = %self.device_type, to = device_type, "reinterpreting channel");
        self.device_type = device_type.to_string();
        self.prompt_pattern = prompt_pattern(device_type);
        Ok(())
    }
}

fn refused<E: std::fmt::Display>(ip: &str) -> impl Fn(E) -> RunbookError + '_ {
    move |e| RunbookError::connection(ip, ConnectPhase::Direct, e)
}

fn normalize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace("\r\n", "\n")
        .replace('\r', "")
}

/// Join the echoed command and the output read after it, trimming trailing
/// blank lines. With `strip_command` only the output is kept.
fn shape_output(command: &str, body: &str, strip_command: bool) -> String {
    let body = body.trim_end_matches(['\n', ' ']);
    match (strip_command, body.is_empty()) {
        (true, _) => body.to_string(),
        (false, true) => command.to_string(),
        (false, false) => format!("{}\n{}", command, body),
    }
}
