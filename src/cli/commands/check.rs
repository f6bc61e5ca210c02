//! Check command implementation.
//!
//! The `netrunbook check` command validates the inventory and runbooks
//! without opening any device session.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::CheckArgs;
use crate::config::{load_inventory, load_runbook, DirectiveKind, Inventory, Runbook};
use crate::error::{Result, RunbookError};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_FAILED, EXIT_UNUSABLE};

/// Findings for one runbook file.
#[derive(Debug, Clone, Serialize)]
pub struct RunbookCheck {
    pub path: PathBuf,
    pub directives: usize,
    pub problems: Vec<String>,
}

/// Findings for a whole `check` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub inventory: PathBuf,
    pub devices: usize,
    pub inventory_problems: Vec<String>,
    pub runbooks: Vec<RunbookCheck>,
}

impl CheckReport {
    pub fn problem_count(&self) -> usize {
        self.inventory_problems.len()
            + self
                .runbooks
                .iter()
                .map(|r| r.problems.len())
                .sum::<usize>()
    }
}

/// Problems in a parsed runbook when run against `inventory`.
pub fn check_runbook(runbook: &Runbook, inventory: &Inventory) -> Vec<String> {
    let mut problems = Vec::new();
    for directive in &runbook.directives {
        let at = format!("line {}", directive.line);
        match directive.kind() {
            None => problems.push(format!("{}: unknown directive '{}'", at, directive.name)),
            Some(DirectiveKind::ConnectTo) => match directive.payload.single("ConnectTo") {
                Ok(device) => match inventory.get(device) {
                    None => problems.push(format!("{}: '{}' is not in the inventory", at, device)),
                    Some(entry) => {
                        if let Some(jump) = &entry.jumphost {
                            if !inventory.contains(jump) {
                                problems.push(format!(
                                    "{}: '{}' uses jumphost '{}' which is not in the inventory",
                                    at, device, jump
                                ));
                            }
                        }
                    }
                },
                Err(e) => problems.push(format!("{}: {}", at, e)),
            },
            Some(DirectiveKind::LogToFile) => {
                if let Err(e) = directive.payload.single("LogToFile") {
                    problems.push(format!("{}: {}", at, e));
                }
            }
            Some(_) => {}
        }
    }
    problems
}

/// The check command implementation.
pub struct CheckCommand {
    inventory_path: PathBuf,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(inventory_path: &Path, args: CheckArgs) -> Self {
        Self {
            inventory_path: inventory_path.to_path_buf(),
            args,
        }
    }

    /// Build the report for an already loaded inventory.
    pub fn build_report(&self, inventory: &Inventory) -> CheckReport {
        let runbooks = self
            .args
            .runbooks
            .iter()
            .map(|path| match load_runbook(path) {
                Ok(runbook) => RunbookCheck {
                    path: path.clone(),
                    directives: runbook.len(),
                    problems: check_runbook(&runbook, inventory),
                },
                Err(e) => RunbookCheck {
                    path: path.clone(),
                    directives: 0,
                    problems: vec![e.to_string()],
                },
            })
            .collect();

        CheckReport {
            inventory: self.inventory_path.clone(),
            devices: inventory.len(),
            inventory_problems: inventory.validate(),
            runbooks,
        }
    }

    fn show(&self, report: &CheckReport, ui: &mut dyn UserInterface) {
        for problem in &report.inventory_problems {
            ui.warning(&format!("{}: {}", report.inventory.display(), problem));
        }
        for runbook in &report.runbooks {
            for problem in &runbook.problems {
                ui.warning(&format!("{}: {}", runbook.path.display(), problem));
            }
            if runbook.problems.is_empty() {
                ui.success(&format!(
                    "{}: {} directives",
                    runbook.path.display(),
                    runbook.directives
                ));
            }
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let inventory = match load_inventory(&self.inventory_path) {
            Ok(inventory) => inventory,
            Err(e) => {
                ui.error(&e.to_string());
                return Ok(CommandResult::failure(EXIT_UNUSABLE));
            }
        };

        let report = self.build_report(&inventory);
        if self.args.json {
            let json =
                serde_json::to_string_pretty(&report).map_err(|e| RunbookError::Other(e.into()))?;
            ui.message(&json);
        } else {
            self.show(&report, ui);
        }

        if report.problem_count() == 0 {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_FAILED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const HOSTS: &str = r#"
r1:
  device_type: alcatel_sros
  ip: 10.0.0.1
r2:
  device_type: alcatel_sros
  ip: 10.0.0.2
  jumphost: bastion
"#;

    fn setup(runbook: &str) -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let hosts = temp.path().join("hosts.yml");
        fs::write(&hosts, HOSTS).unwrap();
        let rb = temp.path().join("rb.yml");
        fs::write(&rb, runbook).unwrap();
        (temp, hosts, rb)
    }

    #[test]
    fn clean_runbook_passes() {
        let (_temp, hosts, rb) = setup("- LogToFile: out.txt\n- ConnectTo: r1\n- Exec: show time\n");
        let hosts_ok = hosts.with_file_name("hosts_ok.yml");
        fs::write(&hosts_ok, "r1:\n  device_type: alcatel_sros\n  ip: 10.0.0.1\n").unwrap();
        let cmd = CheckCommand::new(
            &hosts_ok,
            CheckArgs {
                runbooks: vec![rb],
                json: false,
            },
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.successes()[0].ends_with("rb.yml: 3 directives"));
    }

    #[test]
    fn flags_unknown_devices_directives_and_jumphosts() {
        let (_temp, hosts, rb) =
            setup("- LogToFile: out.txt\n- ConnectTo: r9\n- ConnectTo: r2\n- Reboot: now\n");
        let cmd = CheckCommand::new(
            &hosts,
            CheckArgs {
                runbooks: vec![rb],
                json: false,
            },
        );
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_FAILED);
        assert!(ui.has_warning("line 2: 'r9' is not in the inventory"));
        assert!(ui.has_warning("line 3: 'r2' uses jumphost 'bastion'"));
        assert!(ui.has_warning("line 4: unknown directive 'Reboot'"));
        assert!(ui.has_warning("jumphost 'bastion'"));
    }

    #[test]
    fn missing_runbook_is_a_problem() {
        let (temp, hosts, _rb) = setup("");
        let cmd = CheckCommand::new(
            &hosts,
            CheckArgs {
                runbooks: vec![temp.path().join("nope.yml")],
                json: false,
            },
        );
        let report = cmd.build_report(&load_inventory(&hosts).unwrap());
        assert_eq!(report.runbooks[0].directives, 0);
        assert!(report.runbooks[0].problems[0].contains("nope.yml"));
    }

    #[test]
    fn json_output_is_parseable() {
        let (_temp, hosts, rb) = setup("- Print: hi\n");
        let cmd = CheckCommand::new(
            &hosts,
            CheckArgs {
                runbooks: vec![rb],
                json: true,
            },
        );
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(value["devices"], 2);
        assert_eq!(value["runbooks"][0]["directives"], 1);
    }

    #[test]
    fn missing_inventory_is_unusable() {
        let temp = TempDir::new().unwrap();
        let cmd = CheckCommand::new(&temp.path().join("hosts.yml"), CheckArgs::default());
        let mut ui = MockUI::new();
        let result = cmd.execute(&mut ui).unwrap();
        assert_eq!(result.exit_code, EXIT_UNUSABLE);
    }
}
