//! Table-driven link suites.
//!
//! A suite is a YAML file listing pages, link selectors and where each link
//! should land:
//!
//! ```yaml
//! name: saucedemo
//! defaults:
//!   timeout_ms: 10000
//! cases:
//!   - name: about link
//!     url: https://www.saucedemo.com/v1/inventory.html
//!     selector: "#about_sidebar_link"
//!     expected_host: saucelabs.com
//! ```
//!
//! `expected_host` may be omitted; the link's own href then decides.

use crate::driver::BrowsingSession;
use crate::reporter::{CaseResult, FailureMode, SuiteReport};
use crate::result::{NavError, NavResult};
use crate::target::{resolve_href, ExpectedHost};
use crate::verifier::{NavigationVerifier, Verification, VerifyOptions};
use crate::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// One link to verify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCase {
    /// Case name, unique within the suite
    pub name: String,
    /// Page that holds the link
    pub url: String,
    /// CSS selector of the link
    pub selector: String,
    /// Where the link must land; derived from the href when absent
    #[serde(default)]
    pub expected_host: Option<ExpectedHost>,
    /// Per-case timeout override
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Per-case return-to-origin override
    #[serde(default)]
    pub return_to_origin: Option<bool>,
}

impl LinkCase {
    /// Create a case with an explicit expectation
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        selector: impl Into<String>,
        expected_host: ExpectedHost,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: selector.into(),
            expected_host: Some(expected_host),
            timeout_ms: None,
            return_to_origin: None,
        }
    }

    /// Verifier options for this case
    #[must_use]
    pub fn verify_options(&self, defaults: &SuiteDefaults) -> VerifyOptions {
        VerifyOptions::new()
            .with_timeout(Duration::from_millis(
                self.timeout_ms.unwrap_or(defaults.timeout_ms),
            ))
            .with_poll_interval(Duration::from_millis(defaults.poll_interval_ms))
            .with_return_to_origin(self.return_to_origin.unwrap_or(defaults.return_to_origin))
    }
}

/// Settings shared by every case in a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteDefaults {
    /// Navigation timeout
    pub timeout_ms: u64,
    /// Poll interval
    pub poll_interval_ms: u64,
    /// Navigate back after same-context links
    pub return_to_origin: bool,
}

impl Default for SuiteDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            return_to_origin: true,
        }
    }
}

/// A named list of link cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSuite {
    /// Suite name
    pub name: String,
    /// Shared settings
    #[serde(default)]
    pub defaults: SuiteDefaults,
    /// Cases in run order
    #[serde(default)]
    pub cases: Vec<LinkCase>,
}

impl LinkSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: SuiteDefaults::default(),
            cases: Vec::new(),
        }
    }

    /// Add a case
    #[must_use]
    pub fn with_case(mut self, case: LinkCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Parse a suite from YAML
    pub fn from_yaml(yaml: &str) -> NavResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load and validate a suite file
    pub fn load(path: &Path) -> NavResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let suite = Self::from_yaml(&content)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Check the suite is runnable
    pub fn validate(&self) -> NavResult<()> {
        if self.name.trim().is_empty() {
            return Err(NavError::config("suite name must not be empty"));
        }
        if self.defaults.timeout_ms == 0 {
            return Err(NavError::config(format!(
                "suite {}: timeout_ms must be positive",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for case in &self.cases {
            if case.name.trim().is_empty() {
                return Err(NavError::config(format!(
                    "suite {}: case name must not be empty",
                    self.name
                )));
            }
            if !seen.insert(case.name.as_str()) {
                return Err(NavError::config(format!(
                    "suite {}: duplicate case name '{}'",
                    self.name, case.name
                )));
            }
            if case.selector.trim().is_empty() {
                return Err(NavError::config(format!(
                    "case '{}': selector must not be empty",
                    case.name
                )));
            }
            let page = url::Url::parse(&case.url).map_err(|e| NavError::InvalidUrl {
                url: case.url.clone(),
                message: e.to_string(),
            })?;
            if !matches!(page.scheme(), "http" | "https" | "file") {
                return Err(NavError::config(format!(
                    "case '{}': unsupported scheme {}",
                    case.name,
                    page.scheme()
                )));
            }
            if case.timeout_ms == Some(0) {
                return Err(NavError::config(format!(
                    "case '{}': timeout_ms must be positive",
                    case.name
                )));
            }
        }
        Ok(())
    }

    /// Keep only cases whose name contains `pattern`
    #[must_use]
    pub fn filter(mut self, pattern: &str) -> Self {
        self.cases.retain(|c| c.name.contains(pattern));
        self
    }
}

/// Runs suites against one session
#[derive(Debug, Clone, Copy, Default)]
pub struct SuiteRunner {
    failure_mode: FailureMode,
}

impl SuiteRunner {
    /// Create a runner that collects all failures
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Run every case in order
    pub async fn run<S>(&self, session: &mut S, suite: &LinkSuite) -> SuiteReport
    where
        S: BrowsingSession + ?Sized,
    {
        let mut report = SuiteReport::new(&suite.name);
        info!(suite = %suite.name, cases = suite.cases.len(), "running suite");

        let mut stop_reason: Option<&str> = None;
        for case in &suite.cases {
            if let Some(reason) = stop_reason {
                report.record(CaseResult::skipped(&case.name, reason));
                continue;
            }

            let start = Instant::now();
            match run_case(session, case, &suite.defaults).await {
                Ok(verification) => {
                    info!(case = %case.name, url = %verification.final_url, "passed");
                    report.record(CaseResult::passed(
                        &case.name,
                        start.elapsed(),
                        verification.final_url,
                    ));
                }
                Err(e) => {
                    report.record(CaseResult::failed(&case.name, start.elapsed(), &e));
                    if e.is_fatal() {
                        error!(case = %case.name, error = %e, "session corrupted, aborting run");
                        report.aborted = true;
                        stop_reason = Some("run aborted after a browsing context leak");
                    } else {
                        warn!(case = %case.name, error = %e, "failed");
                        if self.failure_mode == FailureMode::StopOnFirstFailure {
                            stop_reason = Some("run stopped after first failure");
                        }
                    }
                }
            }
        }

        info!("{}", report.summary());
        report
    }
}

async fn run_case<S>(
    session: &mut S,
    case: &LinkCase,
    defaults: &SuiteDefaults,
) -> NavResult<Verification>
where
    S: BrowsingSession + ?Sized,
{
    session.navigate(&case.url).await?;
    let link = session.find_element(&case.selector).await?;

    let expected = match &case.expected_host {
        Some(expected) => expected.clone(),
        None => {
            let href = link.href.as_deref().ok_or_else(|| {
                NavError::config(format!(
                    "case '{}': link has no href and no expected_host",
                    case.name
                ))
            })?;
            let page = session.current_url().await?;
            ExpectedHost::from_href(&resolve_href(&page, href)?)?
        }
    };

    NavigationVerifier::new(case.verify_options(defaults))
        .verify(session, &link, &expected)
        .await
}
