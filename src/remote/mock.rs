//! Scripted transport for testing.
//!
//! `MockTransport` implements [`Transport`] and hands out sessions that
//! share one script and one call log with the transport, so a test can keep
//! the transport, give it to the code under test, and assert afterwards.
//!
//! # Example
//!
//! ```
//! use netrunbook::remote::{ConnectParams, MockCall, MockTransport, SendOptions, Transport};
//! use netrunbook::config::InventoryEntry;
//!
//! let transport = MockTransport::new()
//!     .with_prompt("alcatel_sros", "A:r1#")
//!     .with_output("show time", "12:00:00");
//!
//! let entry = InventoryEntry::new("alcatel_sros", "10.0.0.1");
//! let mut session = transport.open(&ConnectParams::from_entry(&entry)).unwrap();
//! let out = session.send_command("show time", &SendOptions::transcript()).unwrap();
//!
//! assert_eq!(out, "show time\n12:00:00");
//! assert!(!transport.calls().contains(&MockCall::FindPrompt));
//! ```

use super::{ConnectParams, RemoteSession, SendOptions, Transport};
use crate::error::{ConnectPhase, Result, RunbookError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One interaction recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Open { ip: String, device_type: String },
    WriteRaw(String),
    ReadUntil(String),
    SendCommand {
        command: String,
        expect_pattern: Option<String>,
    },
    FindPrompt,
    Reinterpret(String),
}

#[derive(Debug, Default)]
struct Script {
    prompts: HashMap<String, String>,
    outputs: HashMap<String, String>,
    reads: HashMap<String, String>,
    failing_opens: HashSet<String>,
    failing_reads: HashSet<String>,
    failing_commands: HashSet<String>,
    calls: Vec<MockCall>,
    opened: Vec<ConnectParams>,
}

/// Transport that replays canned responses and records every call.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt returned by `find_prompt` while the session uses `device_type`.
    ///
    /// Without one the prompt is `<ip>#`.
    pub fn with_prompt(self, device_type: &str, prompt: &str) -> Self {
        self.script()
            .prompts
            .insert(device_type.to_string(), prompt.to_string());
        self
    }

    /// Output returned for `command` (echo is added unless stripped).
    pub fn with_output(self, command: &str, output: &str) -> Self {
        self.script()
            .outputs
            .insert(command.to_string(), output.to_string());
        self
    }

    /// Text returned by `read_until(pattern)`. Defaults to the pattern itself.
    pub fn with_read(self, pattern: &str, text: &str) -> Self {
        self.script()
            .reads
            .insert(pattern.to_string(), text.to_string());
        self
    }

    /// Make opening a session to `ip` fail.
    pub fn fail_open(self, ip: &str) -> Self {
        self.script().failing_opens.insert(ip.to_string());
        self
    }

    /// Make `read_until(pattern)` time out.
    pub fn fail_read_until(self, pattern: &str) -> Self {
        self.script().failing_reads.insert(pattern.to_string());
        self
    }

    /// Make sending `command` fail.
    pub fn fail_command(self, command: &str) -> Self {
        self.script().failing_commands.insert(command.to_string());
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.script().calls.clone()
    }

    /// Parameters of every `open` call, in order.
    pub fn opened(&self) -> Vec<ConnectParams> {
        self.script().opened.clone()
    }

    /// Commands sent through `send_command`, in order.
    pub fn sent_commands(&self) -> Vec<String> {
        self.script()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::SendCommand { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for MockTransport {
    fn open(&self, params: &ConnectParams) -> Result<Box<dyn RemoteSession>> {
        let mut script = self.script();
        script.calls.push(MockCall::Open {
            ip: params.ip.clone(),
            device_type: params.device_type.clone(),
        });
        script.opened.push(params.clone());
        if script.failing_opens.contains(&params.ip) {
            return Err(RunbookError::connection(
                &params.ip,
                ConnectPhase::Direct,
                "connection refused",
            ));
        }
        drop(script);

        Ok(Box::new(MockSession {
            transport: self.clone(),
            ip: params.ip.clone(),
            device_type: params.device_type.clone(),
        }))
    }
}

/// Session handed out by [`MockTransport`].
#[derive(Debug)]
pub struct MockSession {
    transport: MockTransport,
    ip: String,
    device_type: String,
}

impl RemoteSession for MockSession {
    fn device_type(&self) -> &str {
        &self.device_type
    }

    fn write_raw(&mut self, data: &str) -> Result<()> {
        self.transport
            .script()
            .calls
            .push(MockCall::WriteRaw(data.to_string()));
        Ok(())
    }

    fn read_until(&mut self, pattern: &str) -> Result<String> {
        let mut script = self.transport.script();
        script.calls.push(MockCall::ReadUntil(pattern.to_string()));
        if script.failing_reads.contains(pattern) {
            return Err(anyhow::anyhow!("timed out waiting for /{}/", pattern).into());
        }
        Ok(script
            .reads
            .get(pattern)
            .cloned()
            .unwrap_or_else(|| pattern.to_string()))
    }

    fn send_command(&mut self, command: &str, options: &SendOptions) -> Result<String> {
        let mut script = self.transport.script();
        script.calls.push(MockCall::SendCommand {
            command: command.to_string(),
            expect_pattern: options.expect_pattern.clone(),
        });
        if script.failing_commands.contains(command) {
            return Err(anyhow::anyhow!("channel closed while sending '{}'", command).into());
        }
        let output = script.outputs.get(command).cloned().unwrap_or_default();
        if options.strip_command {
            Ok(output)
        } else if output.is_empty() {
            Ok(command.to_string())
        } else {
            Ok(format!("{}\n{}", command, output))
        }
    }

    fn find_prompt(&mut self) -> Result<String> {
        let mut script = self.transport.script();
        script.calls.push(MockCall::FindPrompt);
        Ok(script
            .prompts
            .get(&self.device_type)
            .cloned()
            .unwrap_or_else(|| format!("{}#", self.ip)))
    }

    fn reinterpret_as(&mut self, device_type: &str) -> Result<()> {
        self.transport
            .script()
            .calls
            .push(MockCall::Reinterpret(device_type.to_string()));
        self.device_type = device_type.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryEntry;

    fn open(transport: &MockTransport) -> Box<dyn RemoteSession> {
        let entry = InventoryEntry::new("alcatel_sros", "10.0.0.1");
        transport.open(&ConnectParams::from_entry(&entry)).unwrap()
    }

    #[test]
    fn records_calls_in_order() {
        let transport = MockTransport::new();
        let mut session = open(&transport);
        session.write_raw("y").unwrap();
        session.find_prompt().unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                MockCall::Open {
                    ip: "10.0.0.1".to_string(),
                    device_type: "alcatel_sros".to_string()
                },
                MockCall::WriteRaw("y".to_string()),
                MockCall::FindPrompt,
            ]
        );
    }

    #[test]
    fn default_prompt_uses_ip() {
        let transport = MockTransport::new();
        let mut session = open(&transport);
        assert_eq!(session.find_prompt().unwrap(), "10.0.0.1#");
    }

    #[test]
    fn send_command_echoes_unless_stripped() {
        let transport = MockTransport::new().with_output("show card", "card 1 up");
        let mut session = open(&transport);
        assert_eq!(
            session
                .send_command("show card", &SendOptions::transcript())
                .unwrap(),
            "show card\ncard 1 up"
        );
        assert_eq!(
            session
                .send_command("show card", &SendOptions::transcript().stripped())
                .unwrap(),
            "card 1 up"
        );
        assert_eq!(
            session.send_command("", &SendOptions::transcript()).unwrap(),
            ""
        );
    }

    #[test]
    fn reinterpret_switches_prompt_family() {
        let transport = MockTransport::new()
            .with_prompt("linux", "ops@jump:~$")
            .with_prompt("alcatel_sros", "A:r1#");
        let entry = InventoryEntry::new("linux", "192.0.2.1");
        let mut session = transport.open(&ConnectParams::from_entry(&entry)).unwrap();
        assert_eq!(session.find_prompt().unwrap(), "ops@jump:~$");
        session.reinterpret_as("alcatel_sros").unwrap();
        assert_eq!(session.device_type(), "alcatel_sros");
        assert_eq!(session.find_prompt().unwrap(), "A:r1#");
    }

    #[test]
    fn scripted_failures() {
        let transport = MockTransport::new()
            .fail_read_until("assword:")
            .fail_command("reboot");
        let mut session = open(&transport);
        assert!(session.read_until("assword:").is_err());
        assert!(session
            .send_command("reboot", &SendOptions::transcript())
            .is_err());
        assert!(transport
            .clone()
            .fail_open("10.0.0.1")
            .open(&ConnectParams::from_entry(&InventoryEntry::new("x", "10.0.0.1")))
            .is_err());
    }
}
