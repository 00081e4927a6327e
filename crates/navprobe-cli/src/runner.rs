//! Command implementations: suite runs, one-off checks, validation

use crate::commands::{BrowserArgs, CheckArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use navprobe::{
    BrowsingSession, CaseResult, ExpectedHost, LinkSuite, NavResult, NavigationVerifier,
    ReportFormat, SessionConfig, SuiteReport, SuiteRunner, Verification, VerifyOptions,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Overall result of a command, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every link verified
    Passed,
    /// At least one link failed
    Failed,
    /// A context leak stopped the run
    Aborted,
}

impl RunOutcome {
    /// Outcome across several suite reports
    #[must_use]
    pub fn from_reports(reports: &[SuiteReport]) -> Self {
        if reports.iter().any(|r| r.aborted) {
            Self::Aborted
        } else if reports.iter().all(SuiteReport::all_passed) {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    /// Process exit code
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
            Self::Aborted => 2,
        }
    }
}

/// Load and validate suite files, printing one line per file
pub fn validate_suites(paths: &[PathBuf], reporter: &ProgressReporter) -> CliResult<Vec<LinkSuite>> {
    let mut suites = Vec::new();
    let mut failed = 0;
    for path in paths {
        match LinkSuite::load(path) {
            Ok(suite) => {
                reporter.success(&format!(
                    "{}: suite '{}' with {} cases",
                    path.display(),
                    suite.name,
                    suite.cases.len()
                ));
                suites.push(suite);
            }
            Err(e) => {
                reporter.failure(&format!("{}: {e}", path.display()));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::InvalidSuites {
            failed,
            total: paths.len(),
        });
    }
    Ok(suites)
}

/// Apply `--filter` and `--timeout-ms` to loaded suites
#[must_use]
pub fn apply_overrides(
    suites: Vec<LinkSuite>,
    filter: Option<&str>,
    timeout_ms: Option<u64>,
) -> Vec<LinkSuite> {
    suites
        .into_iter()
        .map(|suite| {
            let mut suite = match filter {
                Some(pattern) => suite.filter(pattern),
                None => suite,
            };
            if let Some(timeout) = timeout_ms {
                for case in &mut suite.cases {
                    case.timeout_ms = Some(timeout);
                }
            }
            suite
        })
        .collect()
}

/// Browser session settings from command-line flags
#[must_use]
pub fn session_config(args: &BrowserArgs) -> SessionConfig {
    let mut config = SessionConfig::new().headless(!args.headed);
    if args.no_sandbox {
        config = config.no_sandbox();
    }
    if let Some(path) = &args.chromium {
        config = config.chromium_path(path.display().to_string());
    }
    config
}

const fn extension(format: ReportFormat) -> &'static str {
    match format {
        ReportFormat::Text => "txt",
        ReportFormat::Json => "json",
        ReportFormat::Junit => "xml",
    }
}

/// Where to write the report for `suite_name`
pub fn report_path(
    output: &Path,
    suite_name: &str,
    format: ReportFormat,
    suite_count: usize,
) -> CliResult<PathBuf> {
    if output.is_dir() {
        let stem: String = suite_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        return Ok(output.join(format!("{stem}.{}", extension(format))));
    }
    if suite_count > 1 {
        return Err(CliError::invalid_argument(
            "--output must be an existing directory when running several suites",
        ));
    }
    Ok(output.to_path_buf())
}

/// Write reports to `--output`, or to stdout for machine formats
pub fn emit_reports(
    reports: &[SuiteReport],
    format: ReportFormat,
    output: Option<&Path>,
) -> CliResult<()> {
    if let Some(output) = output {
        for report in reports {
            let path = report_path(output, &report.suite_name, format, reports.len())?;
            report.write_to(&path, format)?;
            info!(path = %path.display(), "report written");
        }
        return Ok(());
    }

    match format {
        ReportFormat::Text => {}
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(reports)
                .map_err(|e| CliError::report_generation(e.to_string()))?;
            println!("{json}");
        }
        ReportFormat::Junit => {
            if reports.len() > 1 {
                return Err(CliError::invalid_argument(
                    "JUnit output for several suites needs --output <DIR>",
                ));
            }
            for report in reports {
                print!("{}", report.render_junit());
            }
        }
    }
    Ok(())
}

/// Run suites one after another on one session
///
/// A leak in one suite leaves the session unusable, so every later suite
/// is reported with all cases skipped.
pub async fn run_loaded<S>(
    session: &mut S,
    suites: &[LinkSuite],
    config: &CliConfig,
    reporter: &ProgressReporter,
) -> Vec<SuiteReport>
where
    S: BrowsingSession + ?Sized,
{
    let runner = SuiteRunner::new().with_failure_mode(config.failure_mode());
    let mut reports = Vec::with_capacity(suites.len());
    let mut aborted = false;

    for suite in suites {
        let report = if aborted {
            let mut report = SuiteReport::new(&suite.name);
            for case in &suite.cases {
                report.record(CaseResult::skipped(
                    &case.name,
                    "an earlier suite leaked a browsing context",
                ));
            }
            report
        } else {
            runner.run(session, suite).await
        };
        aborted |= report.aborted;
        reporter.report(&report);
        reports.push(report);
    }
    reports
}

/// Verify one link on `args.url`
pub async fn check_with<S>(session: &mut S, args: &CheckArgs) -> NavResult<Verification>
where
    S: BrowsingSession + ?Sized,
{
    let expected = ExpectedHost::parse(&args.expected_host)?;
    session.navigate(&args.url).await?;
    let link = session.find_element(&args.selector).await?;
    let options = VerifyOptions::new()
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_return_to_origin(!args.stay);
    NavigationVerifier::new(options)
        .verify(session, &link, &expected)
        .await
}

/// `navprobe run`
#[cfg(feature = "browser")]
pub async fn run_suites(config: &CliConfig, args: &RunArgs) -> CliResult<RunOutcome> {
    use navprobe::{ChromiumSession, SessionFixture};

    let reporter = reporter_for(config);
    let suites = validate_suites(&args.suites, &reporter)?;
    let suites = apply_overrides(suites, args.filter.as_deref(), args.timeout_ms);

    let session = ChromiumSession::launch(session_config(&args.browser)).await?;
    let mut fixture = SessionFixture::new(session);
    let reports = run_loaded(fixture.session_mut()?, &suites, config, &reporter).await;
    if let Err(e) = fixture.teardown().await {
        tracing::warn!(error = %e, "browser teardown failed");
    }

    emit_reports(&reports, config.format, args.output.as_deref())?;
    Ok(RunOutcome::from_reports(&reports))
}

/// `navprobe check`
#[cfg(feature = "browser")]
pub async fn check_link(config: &CliConfig, args: &CheckArgs) -> CliResult<RunOutcome> {
    use navprobe::{ChromiumSession, SessionFixture};

    let reporter = reporter_for(config);
    let session = ChromiumSession::launch(session_config(&args.browser)).await?;
    let mut fixture = SessionFixture::new(session);
    let result = check_with(fixture.session_mut()?, args).await;
    if let Err(e) = fixture.teardown().await {
        tracing::warn!(error = %e, "browser teardown failed");
    }

    let verification = result?;
    if args.json {
        let json = serde_json::to_string_pretty(&verification)
            .map_err(|e| CliError::report_generation(e.to_string()))?;
        println!("{json}");
    }
    reporter.success(&format!(
        "{} -> {} ({} ms)",
        args.selector,
        verification.final_url,
        verification.elapsed.as_millis()
    ));
    Ok(RunOutcome::Passed)
}

/// `navprobe run` without browser support
#[cfg(not(feature = "browser"))]
pub async fn run_suites(_config: &CliConfig, _args: &RunArgs) -> CliResult<RunOutcome> {
    Err(CliError::config(
        "built without browser support. Rebuild with --features browser",
    ))
}

/// `navprobe check` without browser support
#[cfg(not(feature = "browser"))]
pub async fn check_link(_config: &CliConfig, _args: &CheckArgs) -> CliResult<RunOutcome> {
    Err(CliError::config(
        "built without browser support. Rebuild with --features browser",
    ))
}

/// Progress reporter honoring color and quiet settings
#[must_use]
pub fn reporter_for(config: &CliConfig) -> ProgressReporter {
    ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use navprobe::{CaseStatus, LinkBehavior, LinkCase, MockLink, MockSession, NavError};

    const SUITE_YAML: &str = r##"
name: demo
defaults:
  timeout_ms: 60
  poll_interval_ms: 5
cases:
  - name: github
    url: https://site.example/form
    selector: "#github"
    expected_host: github.com
  - name: help
    url: https://site.example/form
    selector: "#help"
"##;

    fn quiet() -> ProgressReporter {
        ProgressReporter::new(false, true)
    }

    fn session() -> MockSession {
        let mut session = MockSession::new("about:blank");
        session.add_link(MockLink::new(
            "#github",
            "https://github.com/org/repo",
            LinkBehavior::OpenInNewContext { delay_polls: 1 },
        ));
        session.add_link(MockLink::new(
            "#help",
            "/help",
            LinkBehavior::NavigateInPlace { delay_polls: 0 },
        ));
        session.add_link(MockLink::new(
            "#leak",
            "https://popup.example/",
            LinkBehavior::OpenAndLeak,
        ));
        session
    }

    mod outcome_tests {
        use super::*;

        #[test]
        fn test_exit_codes() {
            assert_eq!(RunOutcome::Passed.exit_code(), 0);
            assert_eq!(RunOutcome::Failed.exit_code(), 1);
            assert_eq!(RunOutcome::Aborted.exit_code(), 2);
        }

        #[test]
        fn test_from_reports() {
            assert_eq!(RunOutcome::from_reports(&[]), RunOutcome::Passed);

            let mut failed = SuiteReport::new("a");
            failed.record(CaseResult::failed(
                "x",
                Duration::ZERO,
                &NavError::config("boom"),
            ));
            assert_eq!(
                RunOutcome::from_reports(&[SuiteReport::new("ok"), failed.clone()]),
                RunOutcome::Failed
            );

            failed.aborted = true;
            assert_eq!(RunOutcome::from_reports(&[failed]), RunOutcome::Aborted);
        }
    }

    mod suite_loading_tests {
        use super::*;

        #[test]
        fn test_validate_suites() {
            let dir = tempfile::tempdir().unwrap();
            let good = dir.path().join("good.yaml");
            std::fs::write(&good, SUITE_YAML).unwrap();
            let suites = validate_suites(&[good.clone()], &quiet()).unwrap();
            assert_eq!(suites.len(), 1);

            let bad = dir.path().join("bad.yaml");
            std::fs::write(&bad, "name: demo\ncases:\n  - name: a\n    url: nope\n    selector: a\n")
                .unwrap();
            let err = validate_suites(&[good, bad], &quiet()).unwrap_err();
            assert!(matches!(err, CliError::InvalidSuites { failed: 1, total: 2 }));
        }

        #[test]
        fn test_apply_overrides() {
            let suite = LinkSuite::from_yaml(SUITE_YAML).unwrap();
            let suites = apply_overrides(vec![suite], Some("help"), Some(250));
            assert_eq!(suites[0].cases.len(), 1);
            assert_eq!(suites[0].cases[0].timeout_ms, Some(250));
        }

        #[test]
        fn test_session_config() {
            let args = BrowserArgs {
                headed: true,
                no_sandbox: true,
                chromium: Some(PathBuf::from("/usr/bin/chromium")),
            };
            let config = session_config(&args);
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
            assert!(session_config(&BrowserArgs::default()).headless);
        }
    }

    mod report_output_tests {
        use super::*;

        #[test]
        fn test_report_path_in_directory() {
            let dir = tempfile::tempdir().unwrap();
            let path = report_path(dir.path(), "sauce demo", ReportFormat::Junit, 3).unwrap();
            assert_eq!(path, dir.path().join("sauce_demo.xml"));
        }

        #[test]
        fn test_report_path_single_file() {
            let path = report_path(Path::new("out.json"), "demo", ReportFormat::Json, 1).unwrap();
            assert_eq!(path, PathBuf::from("out.json"));
        }

        #[test]
        fn test_report_path_several_suites_needs_directory() {
            assert!(report_path(Path::new("out.json"), "demo", ReportFormat::Json, 2).is_err());
        }

        #[test]
        fn test_emit_reports_to_directory() {
            let dir = tempfile::tempdir().unwrap();
            let reports = vec![SuiteReport::new("one"), SuiteReport::new("two")];
            emit_reports(&reports, ReportFormat::Json, Some(dir.path())).unwrap();
            assert!(dir.path().join("one.json").exists());
            assert!(dir.path().join("two.json").exists());
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_loaded_passes() {
            let suite = LinkSuite::from_yaml(SUITE_YAML).unwrap();
            let mut session = session();
            let reports = run_loaded(&mut session, &[suite], &CliConfig::new(), &quiet()).await;
            assert_eq!(RunOutcome::from_reports(&reports), RunOutcome::Passed);
            assert_eq!(reports[0].passed_count(), 2);
        }

        #[tokio::test]
        async fn test_leak_skips_later_suites() {
            let mut leaky = LinkSuite::new("leaky").with_case(LinkCase::new(
                "popup",
                "https://site.example/form",
                "#leak",
                ExpectedHost::parse("popup.example").unwrap(),
            ));
            leaky.defaults.timeout_ms = 60;
            leaky.defaults.poll_interval_ms = 5;
            let later = LinkSuite::from_yaml(SUITE_YAML).unwrap();

            let mut session = session();
            let reports =
                run_loaded(&mut session, &[leaky, later], &CliConfig::new(), &quiet()).await;
            assert_eq!(RunOutcome::from_reports(&reports), RunOutcome::Aborted);
            assert!(reports[1]
                .results
                .iter()
                .all(|r| r.status == CaseStatus::Skipped));
            assert!(!session.was_called("click:#github"));
        }

        #[tokio::test]
        async fn test_check_with() {
            let args = CheckArgs {
                url: "https://site.example/form".into(),
                selector: "#github".into(),
                expected_host: "github.com".into(),
                timeout_ms: 60,
                stay: false,
                json: false,
                browser: BrowserArgs::default(),
            };
            let mut session = session();
            let verification = check_with(&mut session, &args).await.unwrap();
            assert_eq!(verification.final_url, "https://github.com/org/repo");
            assert_eq!(session.context_count(), 1);
        }

        #[tokio::test]
        async fn test_check_with_bad_expectation() {
            let args = CheckArgs {
                url: "https://site.example/form".into(),
                selector: "#github".into(),
                expected_host: " ".into(),
                timeout_ms: 60,
                stay: false,
                json: false,
                browser: BrowserArgs::default(),
            };
            let mut session = session();
            assert!(check_with(&mut session, &args).await.is_err());
            assert!(!session.was_called("navigate"));
        }
    }
}
