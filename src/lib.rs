//! netrunbook - Run YAML runbooks against network device command lines.
//!
//! A runbook is a YAML list of directives (`LogToFile`, `ConnectTo`,
//! `Execute`, `Configure`, `Print`, `Pause`, `Sleep`). Each runbook file is
//! executed in order against devices from an inventory file, and the whole
//! session is written to a transcript that reads like a terminal capture.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Inventory and runbook loading, placeholder expansion
//! - [`engine`] - Directive dispatch, handlers, and the runbook runner
//! - [`error`] - Error types and result aliases
//! - [`remote`] - Device sessions, transports, and jumphost resolution
//! - [`ui`] - Terminal output and the Pause prompt
//!
//! # Example
//!
//! ```
//! use netrunbook::config::{expand, ExpansionContext};
//! use chrono::NaiveDate;
//!
//! let now = NaiveDate::from_ymd_opt(2024, 3, 5)
//!     .unwrap()
//!     .and_hms_opt(7, 8, 9)
//!     .unwrap();
//! let ctx = ExpansionContext::at(&now);
//! let name = expand("health_{year}{month}{day}.txt", &ctx).unwrap();
//! assert_eq!(name, "health_20240305.txt");
//! ```
//!
//! For end-to-end runs against a scripted device, see the integration tests.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod remote;
pub mod ui;

pub use error::{Result, RunbookError};
