//! Placeholder expansion for runbook strings.
//!
//! Runbook values and jumphost connect commands may contain `{name}`
//! placeholders.
//!
//! # Syntax
//!
//! - `{name}` - replaced with the variable's value
//! - `{{` / `}}` - literal `{` / `}` in output
//!
//! # Example
//!
//! ```yaml
//! - LogToFile: "health_{hostname}_{year}{month}{day}.txt"
//! # Connected to r1 on 2024-03-05, produces: health_r1_20240305.txt
//! ```

use crate::config::inventory::ConnectedDevice;
use crate::error::{Result, RunbookError};
use chrono::{Datelike, Timelike};
use std::collections::{HashMap, HashSet};

/// Placeholders that need a connected device to resolve.
pub const DEVICE_VARIABLES: [&str; 2] = ["hostname", "ip"];

/// Placeholders drawn from the clock reading.
pub const TIME_VARIABLES: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// A segment of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder reference: {name}
    Placeholder(String),
}

/// Parse a template containing `{name}` placeholders.
///
/// # Errors
///
/// Returns the reason as a string when a `{` is never closed or a
/// lone `}` appears; callers wrap it into an [`RunbookError::ExpansionError`].
pub fn parse_template(input: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                current_literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                current_literal.push('}');
            }
            '{' => {
                if !current_literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                }

                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(format!("unterminated placeholder '{{{}'", name));
                }
                segments.push(Segment::Placeholder(name));
            }
            '}' => return Err("single '}' encountered".to_string()),
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    Ok(segments)
}

/// Extract all placeholder names from a template.
///
/// Malformed templates yield an empty set.
pub fn extract_placeholders(input: &str) -> HashSet<String> {
    parse_template(input)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Placeholder(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Variables available to a single expansion.
///
/// Built from a clock reading and an optional connected device. The
/// context is a snapshot: expanding the same template against the same
/// context always gives the same result.
#[derive(Debug, Clone, Default)]
pub struct ExpansionContext {
    vars: HashMap<String, String>,
    device_connected: bool,
}

impl ExpansionContext {
    /// Create a context holding the time variables for `now`.
    ///
    /// `month`, `day`, `hour`, `minute`, and `second` are zero padded to two
    /// digits; `year` is not padded.
    pub fn at<T>(now: &T) -> Self
    where
        T: Datelike + Timelike,
    {
        let mut vars = HashMap::new();
        vars.insert("year".to_string(), now.year().to_string());
        vars.insert("month".to_string(), format!("{:02}", now.month()));
        vars.insert("day".to_string(), format!("{:02}", now.day()));
        vars.insert("hour".to_string(), format!("{:02}", now.hour()));
        vars.insert("minute".to_string(), format!("{:02}", now.minute()));
        vars.insert("second".to_string(), format!("{:02}", now.second()));

        Self {
            vars,
            device_connected: false,
        }
    }

    /// Create a context from an explicit variable set.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            device_connected: false,
        }
    }

    /// Add `hostname` and `ip` from the connected device, if any.
    pub fn with_device(mut self, device: Option<&ConnectedDevice>) -> Self {
        if let Some(device) = device {
            self.vars
                .insert("hostname".to_string(), device.hostname.clone());
            self.vars.insert("ip".to_string(), device.entry.ip.clone());
            self.device_connected = true;
        }
        self
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn missing_reason(&self, name: &str) -> String {
        if !self.device_connected && DEVICE_VARIABLES.contains(&name) {
            format!("placeholder '{}' needs a connected device", name)
        } else {
            format!("unknown placeholder '{}'", name)
        }
    }
}

/// Expand every placeholder in `template`.
///
/// # Errors
///
/// Returns `ExpansionError` for a malformed template or any placeholder the
/// context cannot resolve. Unresolved text is never passed through.
pub fn expand(template: &str, context: &ExpansionContext) -> Result<String> {
    let segments = parse_template(template).map_err(|message| RunbookError::ExpansionError {
        template: template.to_string(),
        message,
    })?;

    let mut result = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder(name) => {
                let value =
                    context
                        .resolve(&name)
                        .ok_or_else(|| RunbookError::ExpansionError {
                            template: template.to_string(),
                            message: context.missing_reason(&name),
                        })?;
                result.push_str(value);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::inventory::InventoryEntry;
    use chrono::NaiveDate;

    fn clock_reading() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    fn r1() -> ConnectedDevice {
        ConnectedDevice::new("r1", InventoryEntry::new("alcatel_sros", "10.0.0.1"))
    }

    #[test]
    fn parse_literal_only() {
        let result = parse_template("hello world").unwrap();
        assert_eq!(result, vec![Segment::Literal("hello world".to_string())]);
    }

    #[test]
    fn parse_placeholder_with_surrounding_text() {
        let result = parse_template("log_{hostname}.txt").unwrap();
        assert_eq!(
            result,
            vec![
                Segment::Literal("log_".to_string()),
                Segment::Placeholder("hostname".to_string()),
                Segment::Literal(".txt".to_string()),
            ]
        );
    }

    #[test]
    fn parse_adjacent_placeholders() {
        let result = parse_template("{year}{month}").unwrap();
        assert_eq!(
            result,
            vec![
                Segment::Placeholder("year".to_string()),
                Segment::Placeholder("month".to_string()),
            ]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let result = parse_template("{{literal}}").unwrap();
        assert_eq!(result, vec![Segment::Literal("{literal}".to_string())]);
    }

    #[test]
    fn parse_unterminated_placeholder_fails() {
        assert!(parse_template("log_{hostname").is_err());
    }

    #[test]
    fn parse_lone_closing_brace_fails() {
        assert!(parse_template("oops}").is_err());
    }

    #[test]
    fn parse_empty_string() {
        assert!(parse_template("").unwrap().is_empty());
    }

    #[test]
    fn extract_placeholders_returns_unique_names() {
        let vars = extract_placeholders("{a} {b} {a}");
        assert_eq!(vars.len(), 2);
        assert!(vars.contains("a"));
        assert!(vars.contains("b"));
    }

    #[test]
    fn time_variables_are_zero_padded_except_year() {
        let ctx = ExpansionContext::at(&clock_reading());
        let result = expand("{year}-{month}-{day} {hour}:{minute}:{second}", &ctx).unwrap();
        assert_eq!(result, "2024-03-05 07:08:09");
    }

    #[test]
    fn hostname_and_year_expand() {
        let device = r1();
        let ctx = ExpansionContext::at(&clock_reading()).with_device(Some(&device));
        assert_eq!(expand("{hostname}_{year}", &ctx).unwrap(), "r1_2024");
        assert_eq!(expand("{ip}", &ctx).unwrap(), "10.0.0.1");
    }

    #[test]
    fn expansion_is_deterministic_for_fixed_inputs() {
        let device = r1();
        let ctx = ExpansionContext::at(&clock_reading()).with_device(Some(&device));
        let first = expand("{hostname}_{hour}{minute}{second}", &ctx).unwrap();
        let second = expand("{hostname}_{hour}{minute}{second}", &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_placeholder_fails() {
        let ctx = ExpansionContext::at(&clock_reading());
        let result = expand("{bogus}", &ctx);
        match result {
            Err(RunbookError::ExpansionError { template, message }) => {
                assert_eq!(template, "{bogus}");
                assert!(message.contains("bogus"));
            }
            other => panic!("expected ExpansionError, got {:?}", other),
        }
    }

    #[test]
    fn hostname_without_device_fails() {
        let ctx = ExpansionContext::at(&clock_reading()).with_device(None);
        let result = expand("{hostname}.txt", &ctx);
        match result {
            Err(RunbookError::ExpansionError { message, .. }) => {
                assert!(message.contains("connected device"));
            }
            other => panic!("expected ExpansionError, got {:?}", other),
        }
    }

    #[test]
    fn from_vars_resolves_explicit_values() {
        let mut vars = HashMap::new();
        vars.insert("username".to_string(), "admin".to_string());
        vars.insert("ip".to_string(), "10.0.0.2".to_string());
        let ctx = ExpansionContext::from_vars(vars);
        assert_eq!(
            expand("ssh {username}@{ip}", &ctx).unwrap(),
            "ssh admin@10.0.0.2"
        );
    }

    #[test]
    fn escaped_braces_survive_expansion() {
        let ctx = ExpansionContext::at(&clock_reading());
        assert_eq!(expand("{{year}}={year}", &ctx).unwrap(), "{year}=2024");
    }
}
