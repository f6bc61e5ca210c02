//! Runbook parsing.
//!
//! A runbook is a YAML sequence of single-key mappings. The key names the
//! directive and the value is either one scalar or a sequence of scalars:
//!
//! ```yaml
//! - LogToFile: "health_{hostname}_{year}{month}{day}.txt"
//! - ConnectTo: r1
//! - Execute:
//!   - show version
//!   - show router interface
//! - Sleep: 5
//! ```
//!
//! Parsing keeps the source line of every directive so failures can be
//! reported against the file.

use crate::error::{Result, RunbookError};
use marked_yaml::{LoaderOptions, Node};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The closed set of directives the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    LogToFile,
    ConnectTo,
    Execute,
    Configure,
    Print,
    Pause,
    Sleep,
}

impl DirectiveKind {
    /// Every directive kind, in documentation order.
    pub const ALL: [DirectiveKind; 7] = [
        DirectiveKind::LogToFile,
        DirectiveKind::ConnectTo,
        DirectiveKind::Execute,
        DirectiveKind::Configure,
        DirectiveKind::Print,
        DirectiveKind::Pause,
        DirectiveKind::Sleep,
    ];

    /// Look up a directive by the key used in runbook files.
    ///
    /// `Exec` is accepted as an alias for `Execute`. Names are case sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LogToFile" => Some(DirectiveKind::LogToFile),
            "ConnectTo" => Some(DirectiveKind::ConnectTo),
            "Exec" | "Execute" => Some(DirectiveKind::Execute),
            "Configure" => Some(DirectiveKind::Configure),
            "Print" => Some(DirectiveKind::Print),
            "Pause" => Some(DirectiveKind::Pause),
            "Sleep" => Some(DirectiveKind::Sleep),
            _ => None,
        }
    }

    /// Canonical runbook key.
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::LogToFile => "LogToFile",
            DirectiveKind::ConnectTo => "ConnectTo",
            DirectiveKind::Execute => "Execute",
            DirectiveKind::Configure => "Configure",
            DirectiveKind::Print => "Print",
            DirectiveKind::Pause => "Pause",
            DirectiveKind::Sleep => "Sleep",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A directive's value: one scalar or an ordered list of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Scalar(String),
    Sequence(Vec<String>),
}

impl Payload {
    /// Normalize to an ordered sequence; a scalar becomes a single item.
    pub fn items(&self) -> Vec<&str> {
        match self {
            Payload::Scalar(value) => vec![value.as_str()],
            Payload::Sequence(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Owned form of [`Payload::items`].
    pub fn into_items(self) -> Vec<String> {
        match self {
            Payload::Scalar(value) => vec![value],
            Payload::Sequence(values) => values,
        }
    }

    /// The payload as exactly one value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for a sequence that does not hold exactly
    /// one item.
    pub fn single(&self, directive: &str) -> Result<&str> {
        match self {
            Payload::Scalar(value) => Ok(value),
            Payload::Sequence(values) if values.len() == 1 => Ok(&values[0]),
            Payload::Sequence(values) => Err(RunbookError::configuration(format!(
                "{} takes a single value, got {}",
                directive,
                values.len()
            ))),
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Scalar(value.to_string())
    }
}

impl From<Vec<&str>> for Payload {
    fn from(values: Vec<&str>) -> Self {
        Payload::Sequence(values.into_iter().map(str::to_string).collect())
    }
}

/// One entry of a runbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Key as written in the file (may not be a known directive).
    pub name: String,
    pub payload: Payload,
    /// 1-based source line; 0 when built in code.
    pub line: usize,
}

impl Directive {
    pub fn new(name: &str, payload: impl Into<Payload>) -> Self {
        Self {
            name: name.to_string(),
            payload: payload.into(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn kind(&self) -> Option<DirectiveKind> {
        DirectiveKind::from_name(&self.name)
    }
}

/// A parsed runbook file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runbook {
    pub path: PathBuf,
    pub directives: Vec<Directive>,
}

impl Runbook {
    /// Build a runbook in code (tests, generated runbooks).
    pub fn from_directives(path: impl Into<PathBuf>, directives: Vec<Directive>) -> Self {
        Self {
            path: path.into(),
            directives,
        }
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Names used in the runbook that are not known directives.
    pub fn unknown_directives(&self) -> Vec<&Directive> {
        self.directives
            .iter()
            .filter(|d| d.kind().is_none())
            .collect()
    }
}

/// Load and parse the runbook at `path`.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML or its shape is invalid.
pub fn load_runbook(path: &Path) -> Result<Runbook> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunbookError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RunbookError::Io(e)
        }
    })?;

    parse_runbook(&content, path)
}

/// Parse YAML content into a [`Runbook`].
pub fn parse_runbook(content: &str, source_path: &Path) -> Result<Runbook> {
    let parse_error = |message: String| RunbookError::ConfigParseError {
        path: source_path.to_path_buf(),
        message,
    };

    if content.trim().is_empty() {
        return Ok(Runbook::from_directives(source_path, Vec::new()));
    }

    let options = LoaderOptions::default().toplevel_sequence();
    let root = marked_yaml::parse_yaml_with_options(0, content, options)
        .map_err(|e| parse_error(e.to_string()))?;
    let Node::Sequence(items) = root else {
        return Err(parse_error(
            "runbook must be a sequence of directives".to_string(),
        ));
    };

    let mut directives = Vec::with_capacity(items.len());
    for item in items.iter() {
        let line = line_of(item);
        let Node::Mapping(mapping) = item else {
            return Err(parse_error(format!(
                "line {}: each directive must be a single-key mapping",
                line
            )));
        };
        if mapping.len() != 1 {
            return Err(parse_error(format!(
                "line {}: expected exactly one directive per entry, found {}",
                line,
                mapping.len()
            )));
        }

        for (key, value) in mapping.iter() {
            let line = key.span().start().map(|m| m.line()).unwrap_or(line);
            let name = key.as_str().to_string();
            let payload = payload_of(value).map_err(|message| {
                parse_error(format!("line {}: {}: {}", line, name, message))
            })?;
            directives.push(Directive {
                name,
                payload,
                line,
            });
        }
    }

    Ok(Runbook::from_directives(source_path, directives))
}

fn line_of(node: &Node) -> usize {
    node.span().start().map(|m| m.line()).unwrap_or(0)
}

fn payload_of(node: &Node) -> std::result::Result<Payload, String> {
    match node {
        Node::Scalar(scalar) => Ok(Payload::Scalar(scalar.as_str().to_string())),
        Node::Sequence(values) => values
            .iter()
            .map(|value| match value {
                Node::Scalar(scalar) => Ok(scalar.as_str().to_string()),
                _ => Err("sequence items must be scalars".to_string()),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Payload::Sequence),
        Node::Mapping(_) => Err("value must be a scalar or a sequence of scalars".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Runbook> {
        parse_runbook(content, Path::new("runbook.yml"))
    }

    const HEALTH_CHECK: &str = r#"- LogToFile: "health_{hostname}.txt"
- ConnectTo: r1
- Execute:
  - show version
  - show router interface
- Exec: show time
- Sleep: 0
"#;

    #[test]
    fn scalar_payload_normalizes_to_single_item() {
        let payload = Payload::from("show version");
        assert_eq!(payload.items(), vec!["show version"]);
        assert_eq!(payload.into_items(), vec!["show version".to_string()]);
    }

    #[test]
    fn sequence_payload_preserves_order() {
        let payload = Payload::from(vec!["c", "a", "b"]);
        assert_eq!(payload.items(), vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_sequence_normalizes_to_no_items() {
        let payload = Payload::Sequence(Vec::new());
        assert!(payload.items().is_empty());
    }

    #[test]
    fn single_accepts_scalar_and_one_item_sequence() {
        assert_eq!(Payload::from("r1").single("ConnectTo").unwrap(), "r1");
        assert_eq!(Payload::from(vec!["r1"]).single("ConnectTo").unwrap(), "r1");
        assert!(Payload::from(vec!["r1", "r2"]).single("ConnectTo").is_err());
    }

    #[test]
    fn directive_names_resolve_with_alias() {
        assert_eq!(DirectiveKind::from_name("Exec"), Some(DirectiveKind::Execute));
        assert_eq!(
            DirectiveKind::from_name("Execute"),
            Some(DirectiveKind::Execute)
        );
        assert_eq!(DirectiveKind::from_name("execute"), None);
        assert_eq!(DirectiveKind::from_name("Reboot"), None);
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn parses_directives_in_order_with_lines() {
        let runbook = parse(HEALTH_CHECK).unwrap();
        let names: Vec<_> = runbook.directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["LogToFile", "ConnectTo", "Execute", "Exec", "Sleep"]
        );
        let lines: Vec<_> = runbook.directives.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 6, 7]);
    }

    #[test]
    fn parses_scalar_and_sequence_payloads() {
        let runbook = parse(HEALTH_CHECK).unwrap();
        assert_eq!(runbook.directives[1].payload, Payload::from("r1"));
        assert_eq!(
            runbook.directives[2].payload,
            Payload::from(vec!["show version", "show router interface"])
        );
        assert_eq!(runbook.directives[4].payload, Payload::from("0"));
    }

    #[test]
    fn unknown_directives_are_kept_for_the_runner() {
        let runbook = parse("- Reboot: now\n- Print: hi\n").unwrap();
        assert_eq!(runbook.len(), 2);
        let unknown = runbook.unknown_directives();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].name, "Reboot");
    }

    #[test]
    fn top_level_sequence_is_accepted() {
        let runbook = parse("- LogToFile: out.txt\n- Sleep: [0]\n").unwrap();
        assert_eq!(runbook.len(), 2);
        assert_eq!(runbook.directives[0].name, "LogToFile");
        assert_eq!(runbook.directives[1].payload, Payload::from(vec!["0"]));
        assert_eq!(runbook.directives[1].line, 2);
    }

    #[test]
    fn top_level_mapping_is_rejected() {
        let result = parse("LogToFile: out.txt\n");
        assert!(matches!(result, Err(RunbookError::ConfigParseError { .. })));
    }

    #[test]
    fn multi_key_entry_is_rejected() {
        let result = parse("- LogToFile: out.txt\n  ConnectTo: r1\n");
        assert!(matches!(result, Err(RunbookError::ConfigParseError { .. })));
    }

    #[test]
    fn nested_mapping_value_is_rejected_with_line() {
        let result = parse("- Print: hi\n- Execute:\n    cmd: show version\n");
        match result {
            Err(RunbookError::ConfigParseError { message, .. }) => {
                assert!(message.contains("line 2"));
                assert!(message.contains("Execute"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn empty_file_is_an_empty_runbook() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn load_missing_runbook_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_runbook(&temp.path().join("missing.yml"));
        assert!(matches!(result, Err(RunbookError::ConfigNotFound { .. })));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("rb.yml");
        fs::write(&file, HEALTH_CHECK).unwrap();
        let runbook = load_runbook(&file).unwrap();
        assert_eq!(runbook.path, file);
        assert_eq!(runbook.len(), 5);
    }
}
