//! Device inventory loading.
//!
//! The inventory is a YAML mapping from device identifier to connection
//! details. It is loaded once per process and is read-only afterwards.
//!
//! ```yaml
//! r1:
//!   device_type: alcatel_sros
//!   ip: 10.0.0.1
//!   username: admin
//!   password: admin
//! r2:
//!   device_type: alcatel_sros
//!   ip: 10.0.0.2
//!   username: admin
//!   password: admin
//!   jumphost: bastion
//! bastion:
//!   device_type: linux
//!   ip: 192.0.2.10
//!   username: ops
//!   password: secret
//!   ssh_command: "ssh {username}@{ip}"
//! ```

use crate::error::{Result, RunbookError};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

/// Default inventory file name, looked up in the working directory.
pub const DEFAULT_INVENTORY: &str = "hosts.yml";

/// Connection details for one device.
#[derive(Clone, PartialEq, Deserialize)]
pub struct InventoryEntry {
    /// Device family, e.g. `alcatel_sros`.
    pub device_type: String,

    /// Management address.
    #[serde(alias = "address")]
    pub ip: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Multiplier applied to every transport timeout.
    #[serde(default)]
    pub global_delay_factor: Option<f64>,

    /// Seconds to wait for a pattern before giving up.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Seconds allowed for opening the session.
    #[serde(default)]
    pub session_timeout: Option<u64>,

    /// Identifier of the device to hop through.
    #[serde(default)]
    pub jumphost: Option<String>,

    /// Command template issued on this host to reach a device behind it.
    #[serde(default)]
    pub ssh_command: Option<String>,

    /// Any other keys. Available to connect-command templates, never
    /// forwarded to the transport.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl InventoryEntry {
    /// Create an entry with only the required fields set.
    pub fn new(device_type: &str, ip: &str) -> Self {
        Self {
            device_type: device_type.to_string(),
            ip: ip.to_string(),
            username: None,
            password: None,
            port: None,
            global_delay_factor: None,
            timeout: None,
            session_timeout: None,
            jumphost: None,
            ssh_command: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the login credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Route connections through another inventory device.
    pub fn via_jumphost(mut self, jumphost: &str) -> Self {
        self.jumphost = Some(jumphost.to_string());
        self
    }

    /// Set the connect command used to reach devices behind this host.
    pub fn with_ssh_command(mut self, template: &str) -> Self {
        self.ssh_command = Some(template.to_string());
        self
    }
}

impl fmt::Debug for InventoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryEntry")
            .field("device_type", &self.device_type)
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("port", &self.port)
            .field("jumphost", &self.jumphost)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the device a session is connected to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedDevice {
    /// The inventory identifier that was requested.
    pub hostname: String,
    pub entry: InventoryEntry,
}

impl ConnectedDevice {
    pub fn new(hostname: &str, entry: InventoryEntry) -> Self {
        Self {
            hostname: hostname.to_string(),
            entry,
        }
    }

    pub fn device_type(&self) -> &str {
        &self.entry.device_type
    }

    /// Variables for rendering a jumphost connect command against this device.
    ///
    /// Extra scalar keys are included so templates can reference
    /// site-specific fields.
    pub fn template_vars(&self) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = self
            .entry
            .extra
            .iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
            .collect();

        vars.insert("hostname".to_string(), self.hostname.clone());
        vars.insert("device_type".to_string(), self.entry.device_type.clone());
        vars.insert("ip".to_string(), self.entry.ip.clone());
        if let Some(username) = &self.entry.username {
            vars.insert("username".to_string(), username.clone());
        }
        if let Some(password) = &self.entry.password {
            vars.insert("password".to_string(), password.clone());
        }
        if let Some(port) = self.entry.port {
            vars.insert("port".to_string(), port.to_string());
        }
        vars
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Immutable table of devices keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    devices: BTreeMap<String, InventoryEntry>,
}

impl Inventory {
    /// Build an inventory from `(identifier, entry)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if an identifier appears twice.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, InventoryEntry)>,
    {
        let mut devices = BTreeMap::new();
        for (id, entry) in entries {
            if devices.insert(id.clone(), entry).is_some() {
                return Err(RunbookError::configuration(format!(
                    "duplicate device identifier '{}'",
                    id
                )));
            }
        }
        Ok(Self { devices })
    }

    pub fn get(&self, id: &str) -> Option<&InventoryEntry> {
        self.devices.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// Check that every jumphost reference points at a known device that
    /// can issue a connect command, and that no jumphost is itself behind
    /// another jumphost.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (id, entry) in &self.devices {
            let Some(jump_id) = &entry.jumphost else {
                continue;
            };
            match self.devices.get(jump_id) {
                None => problems.push(format!(
                    "'{}' uses jumphost '{}' which is not in the inventory",
                    id, jump_id
                )),
                Some(jump) => {
                    if jump.ssh_command.is_none() {
                        problems.push(format!(
                            "jumphost '{}' (used by '{}') has no ssh_command",
                            jump_id, id
                        ));
                    }
                    if jump.jumphost.is_some() {
                        problems.push(format!(
                            "jumphost '{}' (used by '{}') is itself behind a jumphost",
                            jump_id, id
                        ));
                    }
                }
            }
        }
        problems
    }
}

impl<'de> Deserialize<'de> for Inventory {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InventoryVisitor;

        impl<'de> Visitor<'de> for InventoryVisitor {
            type Value = Inventory;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of device identifiers to connection details")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Inventory, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut devices = BTreeMap::new();
                while let Some((id, entry)) = map.next_entry::<String, InventoryEntry>()? {
                    if devices.contains_key(&id) {
                        return Err(de::Error::custom(format!(
                            "duplicate device identifier '{}'",
                            id
                        )));
                    }
                    devices.insert(id, entry);
                }
                Ok(Inventory { devices })
            }

            fn visit_unit<E>(self) -> std::result::Result<Inventory, E>
            where
                E: de::Error,
            {
                Ok(Inventory::default())
            }
        }

        deserializer.deserialize_map(InventoryVisitor)
    }
}

/// Load the inventory file at `path`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_inventory(path: &Path) -> Result<Inventory> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunbookError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RunbookError::Io(e)
        }
    })?;

    parse_inventory(&content, path)
}

/// Parse YAML content into an [`Inventory`].
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_inventory(content: &str, source_path: &Path) -> Result<Inventory> {
    if content.trim().is_empty() {
        return Ok(Inventory::default());
    }
    serde_yaml::from_str(content).map_err(|e| RunbookError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const HOSTS: &str = r#"
r1:
  device_type: alcatel_sros
  ip: 10.0.0.1
  username: admin
  password: admin
  port: 22
  timeout: 30
  site: lab-a
r2:
  device_type: alcatel_sros
  address: 10.0.0.2
  username: admin
  password: hunter2
  jumphost: bastion
bastion:
  device_type: linux
  ip: 192.0.2.10
  username: ops
  password: secret
  ssh_command: "ssh {username}@{ip}"
"#;

    fn path() -> PathBuf {
        PathBuf::from("hosts.yml")
    }

    #[test]
    fn parses_entries_and_optional_fields() {
        let inventory = parse_inventory(HOSTS, &path()).unwrap();
        assert_eq!(inventory.len(), 3);

        let r1 = inventory.get("r1").unwrap();
        assert_eq!(r1.device_type, "alcatel_sros");
        assert_eq!(r1.ip, "10.0.0.1");
        assert_eq!(r1.port, Some(22));
        assert_eq!(r1.timeout, Some(30));
        assert!(r1.jumphost.is_none());
    }

    #[test]
    fn address_is_an_alias_for_ip() {
        let inventory = parse_inventory(HOSTS, &path()).unwrap();
        assert_eq!(inventory.get("r2").unwrap().ip, "10.0.0.2");
    }

    #[test]
    fn unknown_keys_are_kept_as_extra() {
        let inventory = parse_inventory(HOSTS, &path()).unwrap();
        let r1 = inventory.get("r1").unwrap();
        assert_eq!(
            r1.extra.get("site"),
            Some(&serde_yaml::Value::String("lab-a".to_string()))
        );
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let dup = "r1:\n  device_type: a\n  ip: 1.1.1.1\nr1:\n  device_type: b\n  ip: 2.2.2.2\n";
        let result = parse_inventory(dup, &path());
        assert!(matches!(
            result,
            Err(RunbookError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn from_entries_rejects_duplicates() {
        let result = Inventory::from_entries(vec![
            ("r1".to_string(), InventoryEntry::new("alcatel_sros", "10.0.0.1")),
            ("r1".to_string(), InventoryEntry::new("alcatel_sros", "10.0.0.2")),
        ]);
        assert!(matches!(
            result,
            Err(RunbookError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn empty_file_is_an_empty_inventory() {
        let inventory = parse_inventory("\n", &path()).unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let result = parse_inventory("r1:\n  ip: 10.0.0.1\n", &path());
        match result {
            Err(RunbookError::ConfigParseError { message, .. }) => {
                assert!(message.contains("device_type"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn load_missing_file_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_inventory(&temp.path().join("hosts.yml"));
        assert!(matches!(result, Err(RunbookError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hosts.yml");
        fs::write(&file, HOSTS).unwrap();
        let inventory = load_inventory(&file).unwrap();
        assert!(inventory.contains("bastion"));
    }

    #[test]
    fn validate_accepts_well_formed_jumphosts() {
        let inventory = parse_inventory(HOSTS, &path()).unwrap();
        assert!(inventory.validate().is_empty());
    }

    #[test]
    fn validate_flags_missing_jumphost_and_command() {
        let inventory = Inventory::from_entries(vec![
            (
                "r1".to_string(),
                InventoryEntry::new("alcatel_sros", "10.0.0.1").via_jumphost("ghost"),
            ),
            (
                "r2".to_string(),
                InventoryEntry::new("alcatel_sros", "10.0.0.2").via_jumphost("j"),
            ),
            ("j".to_string(), InventoryEntry::new("linux", "192.0.2.1")),
        ])
        .unwrap();
        let problems = inventory.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().any(|p| p.contains("ghost")));
        assert!(problems.iter().any(|p| p.contains("ssh_command")));
    }

    #[test]
    fn template_vars_include_fields_and_extras() {
        let inventory = parse_inventory(HOSTS, &path()).unwrap();
        let device = ConnectedDevice::new("r1", inventory.get("r1").unwrap().clone());
        let vars = device.template_vars();
        assert_eq!(vars.get("hostname").map(String::as_str), Some("r1"));
        assert_eq!(vars.get("ip").map(String::as_str), Some("10.0.0.1"));
        assert_eq!(vars.get("port").map(String::as_str), Some("22"));
        assert_eq!(vars.get("site").map(String::as_str), Some("lab-a"));
    }

    #[test]
    fn debug_output_hides_password() {
        let entry = InventoryEntry::new("alcatel_sros", "10.0.0.1").with_credentials("admin", "s3cret");
        let rendered = format!("{:?}", entry);
        assert!(!rendered.contains("s3cret"));
    }
}
