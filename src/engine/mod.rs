//! Runbook execution engine.
//!
//! - [`runner`] - walks runbooks and batches of runbook files
//! - [`dispatch`] - maps directive names to handlers
//! - [`handlers`] - one handler per directive
//! - [`quirks`] - device-family command special cases
//! - [`state`] - per-runbook session state
//! - [`transcript`] - the log file
//! - [`clock`] - wall clock and sleeping
//!
//! # Example
//!
//! ```
//! use netrunbook::config::{parse_runbook, Inventory};
//! use netrunbook::engine::RunbookRunner;
//! use netrunbook::remote::MockTransport;
//! use netrunbook::ui::MockUI;
//! use std::path::Path;
//!
//! let runbook = parse_runbook("- Nonsense: 1\n", Path::new("rb.yml")).unwrap();
//! let inventory = Inventory::default();
//! let transport = MockTransport::new();
//! let mut ui = MockUI::new();
//!
//! let report = RunbookRunner::new(&inventory, &transport)
//!     .run(&runbook, &mut ui)
//!     .unwrap();
//! assert_eq!(report.unknown_directives, vec!["Nonsense"]);
//! ```

pub mod clock;
pub mod dispatch;
pub mod handlers;
pub mod quirks;
pub mod runner;
pub mod state;
pub mod transcript;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dispatch::{dispatch, handler_for, Dispatch};
pub use handlers::{DirectiveHandler, HandlerContext};
pub use runner::{BatchReport, FileOutcome, RunReport, RunbookRunner};
pub use state::SessionState;
pub use transcript::LogSink;
