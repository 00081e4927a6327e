//! Navprobe CLI library
//!
//! Command-line interface for running link suites and one-off link checks.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{BrowserArgs, CheckArgs, Cli, ColorArg, Commands, FormatArg, RunArgs, ValidateArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{
    apply_overrides, check_link, check_with, emit_reports, report_path, reporter_for, run_loaded,
    run_suites, session_config, validate_suites, RunOutcome,
};
