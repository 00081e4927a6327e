//! Navprobe CLI: verify that external links land where they should
//!
//! ## Usage
//!
//! ```bash
//! navprobe validate suites/*.yaml                  # Check suite files
//! navprobe run suites/saucedemo.yaml               # Run a suite
//! navprobe run suites/*.yaml --format junit -o out # JUnit reports per suite
//! navprobe check https://www.saucedemo.com/v1/inventory.html \
//!     "#about_sidebar_link" saucelabs.com          # One link
//! ```

use clap::Parser;
use navprobe_cli::{
    check_link, logging, reporter_for, run_suites, validate_suites, Cli, CliConfig, CliError,
    CliResult, ColorChoice, Commands, RunOutcome, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<RunOutcome> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init(config.verbosity, cli.log_json);

    match cli.command {
        Commands::Run(args) => {
            let config = config
                .with_fail_fast(args.fail_fast)
                .with_format(args.format.into());
            block_on(run_suites(&config, &args))
        }
        Commands::Check(args) => block_on(check_link(&config, &args)),
        Commands::Validate(args) => {
            let _ = validate_suites(&args.suites, &reporter_for(&config))?;
            Ok(RunOutcome::Passed)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn block_on<F>(future: F) -> CliResult<RunOutcome>
where
    F: std::future::Future<Output = CliResult<RunOutcome>>,
{
    let rt = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    rt.block_on(future)
}
