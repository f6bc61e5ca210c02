//! Device connectivity.
//!
//! Reaches a device either directly or through one jumphost. For the
//! jumphost path the jumphost's session is opened first, the target's
//! connect command is typed into it, the target's password is answered,
//! and the same channel is then re-read with the target's prompt rules.

use super::{ConnectParams, RemoteSession, Transport};
use crate::config::{expand, ConnectedDevice, ExpansionContext, Inventory};
use crate::error::{ConnectPhase, Result, RunbookError};

/// Substring that marks a password prompt. Matching on the tail avoids
/// depending on `Password:` vs `password:` and surrounding whitespace.
pub const PASSWORD_PROMPT: &str = "assword:";

/// A freshly established session and the device it reached.
pub struct Connection {
    pub session: Box<dyn RemoteSession>,
    /// Inventory snapshot of the target, with `hostname` set to the id that
    /// was requested (never the jumphost).
    pub device: ConnectedDevice,
    /// Prompt read right after connecting.
    pub prompt: String,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("device", &self.device)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// Progress events emitted while connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectProgress {
    /// Opening the jumphost's own session.
    OpeningJumphost { jumphost: String },
    /// Opening (or, behind a jumphost, dialing) the target.
    Opening { device: String },
    /// Target password prompt seen; answering it.
    SendingPassword,
}

/// Connect to `device_id`.
///
/// # Errors
///
/// - `UnknownDevice` if `device_id` is not in the inventory
/// - `ConfigurationError` for a jumphost that is missing, has no
///   `ssh_command`, or a target with no password to answer with
/// - `ConnectionError` tagged with the phase that failed
pub fn connect<F>(
    device_id: &str,
    inventory: &Inventory,
    transport: &dyn Transport,
    mut on_progress: F,
) -> Result<Connection>
where
    F: FnMut(ConnectProgress),
{
    let entry = inventory
        .get(device_id)
        .ok_or_else(|| RunbookError::UnknownDevice {
            device: device_id.to_string(),
        })?;
    let device = ConnectedDevice::new(device_id, entry.clone());

    let (mut session, phase) = match &entry.jumphost {
        Some(jump_id) => (
            open_via_jumphost(&device, jump_id, inventory, transport, &mut on_progress)?,
            ConnectPhase::Jumphost,
        ),
        None => {
            on_progress(ConnectProgress::Opening {
                device: device_id.to_string(),
            });
            tracing::info!(device = device_id, ip = %entry.ip, "opening direct session");
            let session = transport
                .open(&ConnectParams::from_entry(entry))
                .map_err(in_phase(device_id, ConnectPhase::Direct))?;
            (session, ConnectPhase::Direct)
        }
    };

    // Resynchronize with whatever the device printed after login.
    let prompt = session.find_prompt().map_err(in_phase(device_id, phase))?;
    tracing::debug!(device = device_id, prompt = %prompt, "connected");

    Ok(Connection {
        session,
        device,
        prompt,
    })
}

fn open_via_jumphost<F>(
    target: &ConnectedDevice,
    jump_id: &str,
    inventory: &Inventory,
    transport: &dyn Transport,
    on_progress: &mut F,
) -> Result<Box<dyn RemoteSession>>
where
    F: FnMut(ConnectProgress),
{
    let device_id = target.hostname.as_str();
    let jump = inventory.get(jump_id).ok_or_else(|| {
        RunbookError::configuration(format!(
            "'{}' uses jumphost '{}' which is not in the inventory",
            device_id, jump_id
        ))
    })?;
    let template = jump.ssh_command.as_deref().ok_or_else(|| {
        RunbookError::configuration(format!(
            "jumphost '{}' has no ssh_command to reach '{}'",
            jump_id, device_id
        ))
    })?;
    let password = target.entry.password.as_deref().ok_or_else(|| {
        RunbookError::configuration(format!(
            "'{}' is behind jumphost '{}' but has no password",
            device_id, jump_id
        ))
    })?;
    let dial = expand(template, &ExpansionContext::from_vars(target.template_vars()))?;

    on_progress(ConnectProgress::OpeningJumphost {
        jumphost: jump_id.to_string(),
    });
    tracing::info!(device = device_id, jumphost = jump_id, "opening jumphost session");
    let mut session = transport
        .open(&ConnectParams::from_entry(jump))
        .map_err(in_phase(device_id, ConnectPhase::Jumphost))?;
    session
        .find_prompt()
        .map_err(in_phase(device_id, ConnectPhase::Jumphost))?;

    on_progress(ConnectProgress::Opening {
        device: device_id.to_string(),
    });
    session
        .write_raw(&format!("{}\n", dial))
        .map_err(in_phase(device_id, ConnectPhase::Jumphost))?;
    session
        .read_until(PASSWORD_PROMPT)
        .map_err(in_phase(device_id, ConnectPhase::PasswordWait))?;

    on_progress(ConnectProgress::SendingPassword);
    session
        .write_raw(&format!("{}\n", password))
        .map_err(in_phase(device_id, ConnectPhase::PasswordWait))?;

    session
        .reinterpret_as(&target.entry.device_type)
        .map_err(in_phase(device_id, ConnectPhase::Jumphost))?;

    Ok(session)
}

/// Tag a transport failure with the device and phase it happened in.
///
/// Configuration errors pass through untouched; they are not transport
/// failures.
fn in_phase(device_id: &str, phase: ConnectPhase) -> impl FnOnce(RunbookError) -> RunbookError + '_ {
    move |err| match err {
        RunbookError::ConnectionError { message, .. } => {
            RunbookError::connection(device_id, phase, message)
        }
        err @ (RunbookError::ConfigurationError { .. } | RunbookError::UnknownDevice { .. }) => err,
        other => RunbookError::connection(device_id, phase, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryEntry;
    use crate::remote::mock::{MockCall, MockTransport};

    fn inventory() -> Inventory {
        Inventory::from_entries(vec![
            (
                "r1".to_string(),
                InventoryEntry::new("alcatel_sros", "10.0.0.1").with_credentials("admin", "pw1"),
            ),
            (
                "r2".to_string(),
                InventoryEntry::new("alcatel_sros", "10.0.0.2")
                    .with_credentials("admin", "pw2")
                    .via_jumphost("bastion"),
            ),
            (
                "bastion".to_string(),
                InventoryEntry::new("linux", "192.0.2.10")
                    .with_credentials("ops", "secret")
                    .with_ssh_command("ssh {username}@{ip}"),
            ),
            (
                "orphan".to_string(),
                InventoryEntry::new("alcatel_sros", "10.0.0.3")
                    .with_credentials("admin", "pw3")
                    .via_jumphost("ghost"),
            ),
        ])
        .unwrap()
    }

    fn transport() -> MockTransport {
        MockTransport::new()
            .with_prompt("alcatel_sros", "A:r#")
            .with_prompt("linux", "ops@bastion:~$")
    }

    #[test]
    fn unknown_device_fails() {
        let result = connect("nope", &inventory(), &transport(), |_| {});
        assert!(matches!(result, Err(RunbookError::UnknownDevice { .. })));
    }

    #[test]
    fn direct_connect_opens_once_and_reads_prompt() {
        let transport = transport();
        let connection = connect("r1", &inventory(), &transport, |_| {}).unwrap();

        assert_eq!(connection.prompt, "A:r#");
        assert_eq!(connection.device.hostname, "r1");
        assert_eq!(
            transport.calls(),
            vec![
                MockCall::Open {
                    ip: "10.0.0.1".to_string(),
                    device_type: "alcatel_sros".to_string()
                },
                MockCall::FindPrompt,
            ]
        );
    }

    #[test]
    fn direct_connect_forwards_only_whitelisted_params() {
        let transport = transport();
        connect("r1", &inventory(), &transport, |_| {}).unwrap();
        let opened = transport.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0], ConnectParams::from_entry(inventory().get("r1").unwrap()));
    }

    #[test]
    fn jumphost_connect_runs_two_phases_over_one_channel() {
        let transport = transport();
        let connection = connect("r2", &inventory(), &transport, |_| {}).unwrap();

        assert_eq!(connection.device.hostname, "r2");
        assert_eq!(connection.device.device_type(), "alcatel_sros");
        assert_eq!(connection.prompt, "A:r#");
        assert_eq!(transport.opened().len(), 1);
        assert_eq!(transport.opened()[0].ip, "192.0.2.10");
        assert_eq!(
            transport.calls(),
            vec![
                MockCall::Open {
                    ip: "192.0.2.10".to_string(),
                    device_type: "linux".to_string()
                },
                MockCall::FindPrompt,
                MockCall::WriteRaw("ssh admin@10.0.0.2\n".to_string()),
                MockCall::ReadUntil(PASSWORD_PROMPT.to_string()),
                MockCall::WriteRaw("pw2\n".to_string()),
                MockCall::Reinterpret("alcatel_sros".to_string()),
                MockCall::FindPrompt,
            ]
        );
    }

    #[test]
    fn jumphost_connect_reports_progress_in_order() {
        let mut events = Vec::new();
        connect("r2", &inventory(), &transport(), |e| events.push(e)).unwrap();
        assert_eq!(
            events,
            vec![
                ConnectProgress::OpeningJumphost {
                    jumphost: "bastion".to_string()
                },
                ConnectProgress::Opening {
                    device: "r2".to_string()
                },
                ConnectProgress::SendingPassword,
            ]
        );
    }

    #[test]
    fn missing_jumphost_is_a_configuration_error() {
        let result = connect("orphan", &inventory(), &transport(), |_| {});
        assert!(matches!(
            result,
            Err(RunbookError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn password_wait_failure_is_tagged() {
        let transport = transport().fail_read_until(PASSWORD_PROMPT);
        let result = connect("r2", &inventory(), &transport, |_| {});
        match result {
            Err(RunbookError::ConnectionError { device, phase, .. }) => {
                assert_eq!(device, "r2");
                assert_eq!(phase, ConnectPhase::PasswordWait);
            }
            other => panic!("expected ConnectionError, got {:?}", other),
        }
    }

    #[test]
    fn jumphost_open_failure_is_tagged() {
        let transport = transport().fail_open("192.0.2.10");
        let result = connect("r2", &inventory(), &transport, |_| {});
        assert!(matches!(
            result,
            Err(RunbookError::ConnectionError {
                phase: ConnectPhase::Jumphost,
                ..
            })
        ));
    }

    #[test]
    fn direct_open_failure_is_tagged() {
        let transport = transport().fail_open("10.0.0.1");
        let result = connect("r1", &inventory(), &transport, |_| {});
        assert!(matches!(
            result,
            Err(RunbookError::ConnectionError {
                phase: ConnectPhase::Direct,
                ..
            })
        ));
    }
}
