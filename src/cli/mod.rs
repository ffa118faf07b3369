//! CLI command handlers.
//!
//! Testable command handlers invoked by main.rs. Each handler implements
//! the logic of one subcommand and returns the process exit code.

mod convert;
mod diff;
mod import;
pub mod output;
mod reconcile;
mod resources;

pub use convert::{run_convert, ConvertCommand};
pub use diff::{run_diff, DiffCommand};
pub use import::{run_import, ImportCommand};
pub use reconcile::{run_reconcile, ReconcileCommand};
pub use resources::{load_model, load_resources};

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Clean: no drift, valid import, or poll satisfied
    pub const SUCCESS: i32 = 0;
    /// Drift detected, capacity invalid, or poll not satisfied
    pub const DRIFT_OR_INVALID: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
