//! Inventory and runbook loading, plus placeholder expansion.
//!
//! - Device inventory in [`inventory`]
//! - Runbook files and directives in [`runbook`]
//! - `{placeholder}` expansion in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use netrunbook::config::{parse_runbook, DirectiveKind};
//! use std::path::Path;
//!
//! let runbook = parse_runbook("- Exec: show version\n", Path::new("rb.yml")).unwrap();
//! assert_eq!(runbook.directives[0].kind(), Some(DirectiveKind::Execute));
//! ```

pub mod interpolation;
pub mod inventory;
pub mod runbook;

// Interpolation re-exports
pub use interpolation::{
    expand, extract_placeholders, parse_template, ExpansionContext, Segment, DEVICE_VARIABLES,
    TIME_VARIABLES,
};

// Inventory re-exports
pub use inventory::{
    load_inventory, parse_inventory, ConnectedDevice, Inventory, InventoryEntry,
    DEFAULT_INVENTORY,
};

// Runbook re-exports
pub use runbook::{load_runbook, parse_runbook, Directive, DirectiveKind, Payload, Runbook};
