//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Navprobe: verify that external links land on the expected host
#[derive(Parser, Debug)]
#[command(name = "navprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit log lines as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run link suites in a browser
    Run(RunArgs),

    /// Verify a single link
    Check(CheckArgs),

    /// Parse and validate suite files without a browser
    Validate(ValidateArgs),
}

/// Browser launch options shared by commands that open a browser
#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Path to the Chromium executable
    #[arg(long, env = "NAVPROBE_CHROMIUM")]
    pub chromium: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite files (YAML)
    #[arg(required = true)]
    pub suites: Vec<PathBuf>,

    /// Only run cases whose name contains this pattern
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Override every case's navigation timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Stop a suite at its first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Write the report to this file (or directory, for several suites)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Page that holds the link
    pub url: String,

    /// CSS selector of the link
    pub selector: String,

    /// Host the link must reach (host, host/path or full URL)
    pub expected_host: String,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "10000", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,

    /// Stay on the target after a same-tab navigation
    #[arg(long)]
    pub stay: bool,

    /// Print the verification as JSON
    #[arg(long)]
    pub json: bool,

    /// Browser options
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Suite files (YAML)
    #[arg(required = true)]
    pub suites: Vec<PathBuf>,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
    /// JUnit XML
    Junit,
}

impl From<FormatArg> for navprobe::ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Junit => Self::Junit,
        }
    }
}

/// Color choice argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
