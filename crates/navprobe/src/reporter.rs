//! Reporter - per-case results and suite reports.
//!
//! A run either collects every failure or stops at the first one
//! ([`FailureMode`]). A fatal error (leaked context) always stops the run;
//! the cases that never ran are reported as skipped.
//!
//! Reports render as plain text, JSON, or JUnit XML. JUnit output separates
//! assertion-style failures (wrong host, timeout, unclickable link) from
//! errors (driver trouble, leaked contexts), the way CI report readers expect.

use crate::result::{ErrorKind, NavError, NavResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Failure mode for a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Run every case and collect all failures
    #[default]
    CollectAll,
    /// Stop on the first failed case
    StopOnFirstFailure,
}

/// Case result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Link verified
    Passed,
    /// Verification or driver failure
    Failed,
    /// Not run
    Skipped,
}

impl CaseStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Result of one link case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case name
    pub name: String,
    /// Case status
    pub status: CaseStatus,
    /// Duration of the case
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// URL the link reached, when it passed
    pub final_url: Option<String>,
    /// Error message if failed, or skip reason
    pub error: Option<String>,
    /// Error classification if failed
    pub error_kind: Option<ErrorKind>,
}

impl CaseResult {
    /// Create a passing result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration, final_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Passed,
            duration,
            final_url: Some(final_url.into()),
            error: None,
            error_kind: None,
        }
    }

    /// Create a failing result from the error that ended the case
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: &NavError) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Failed,
            duration,
            final_url: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Skipped,
            duration: Duration::ZERO,
            final_url: None,
            error: Some(reason.into()),
            error_kind: None,
        }
    }

    /// Whether JUnit should report this as an error rather than a failure
    fn is_error(&self) -> bool {
        matches!(
            self.error_kind,
            Some(ErrorKind::Driver | ErrorKind::HandleLeak)
        )
    }
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
    /// JUnit XML
    Junit,
}

/// Results of running one suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// RFC 3339 start time
    pub started_at: String,
    /// Case results in run order
    pub results: Vec<CaseResult>,
    /// Whether a fatal error stopped the run
    pub aborted: bool,
}

impl SuiteReport {
    /// Create an empty report stamped with the current time
    #[must_use]
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            started_at: chrono::Utc::now().to_rfc3339(),
            results: Vec::new(),
            aborted: false,
        }
    }

    /// Record a case result
    pub fn record(&mut self, result: CaseResult) {
        self.results.push(result);
    }

    /// Number of passed cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Number of failed cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Number of skipped cases
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == CaseStatus::Skipped)
            .count()
    }

    /// Total number of cases
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// True when nothing failed and the run was not aborted
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.aborted && self.failed_count() == 0
    }

    /// Sum of case durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Failed cases
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseResult> {
        self.results.iter().filter(|r| r.status.is_failed()).collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed, {} failed, {} skipped",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.failed_count(),
            self.skipped_count()
        );
        if self.aborted {
            line.push_str(" (aborted: browsing context leak)");
        }
        line
    }

    /// Render in the given format
    pub fn render(&self, format: ReportFormat) -> NavResult<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => self.render_json(),
            ReportFormat::Junit => Ok(self.render_junit()),
        }
    }

    /// Write the rendered report to `output_path`
    pub fn write_to(&self, output_path: &Path, format: ReportFormat) -> NavResult<()> {
        let rendered = self.render(format)?;
        std::fs::write(output_path, rendered)?;
        Ok(())
    }

    /// Render plain text
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            let mark = match result.status {
                CaseStatus::Passed => "PASS",
                CaseStatus::Failed => "FAIL",
                CaseStatus::Skipped => "SKIP",
            };
            out.push_str(&format!(
                "{mark} {} ({} ms)",
                result.name,
                result.duration.as_millis()
            ));
            if let Some(url) = &result.final_url {
                out.push_str(&format!(" -> {url}"));
            }
            out.push('\n');
            if let Some(error) = &result.error {
                out.push_str(&format!("     {error}\n"));
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    /// Render JSON
    pub fn render_json(&self) -> NavResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let errors = self.results.iter().filter(|r| r.is_error()).count();
        let failures = self.failed_count() - errors;

        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" errors="{}" skipped="{}" time="{:.3}" timestamp="{}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            failures,
            errors,
            self.skipped_count(),
            self.total_duration().as_secs_f64(),
            escape_xml(&self.started_at)
        ));
        xml.push('\n');

        for result in &self.results {
            xml.push_str(&format!(
                r#"  <testcase name="{}" classname="{}" time="{:.3}">"#,
                escape_xml(&result.name),
                escape_xml(&self.suite_name),
                result.duration.as_secs_f64()
            ));
            xml.push('\n');

            let message = result.error.as_deref().unwrap_or_default();
            let kind = result.error_kind.map_or("", |k| k.as_str());
            match result.status {
                CaseStatus::Passed => {}
                CaseStatus::Skipped => {
                    xml.push_str(&format!(
                        "    <skipped message=\"{}\"/>\n",
                        escape_xml(message)
                    ));
                }
                CaseStatus::Failed => {
                    let tag = if result.is_error() { "error" } else { "failure" };
                    xml.push_str(&format!(
                        "    <{tag} type=\"{kind}\" message=\"{}\">{}</{tag}>\n",
                        escape_xml(message),
                        escape_xml(message)
                    ));
                }
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_report() -> SuiteReport {
        let mut report = SuiteReport::new("saucedemo");
        report.record(CaseResult::passed(
            "about link",
            Duration::from_millis(1200),
            "https://saucelabs.com/",
        ));
        report.record(CaseResult::failed(
            "twitter link",
            Duration::from_millis(800),
            &NavError::DomainMismatch {
                expected: "twitter.com".into(),
                actual_url: "https://x.com/saucelabs".into(),
            },
        ));
        report.record(CaseResult::failed(
            "facebook link",
            Duration::from_millis(50),
            &NavError::session("target crashed"),
        ));
        report.record(CaseResult::skipped("linkedin link", "run aborted"));
        report
    }

    mod counting_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = sample_report();
            assert_eq!(report.total_count(), 4);
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 2);
            assert_eq!(report.skipped_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.failures().len(), 2);
            assert_eq!(report.total_duration(), Duration::from_millis(2050));
        }

        #[test]
        fn test_empty_report_passes() {
            let report = SuiteReport::new("empty");
            assert!(report.all_passed());
            assert_eq!(report.summary(), "empty: 0/0 passed, 0 failed, 0 skipped");
        }

        #[test]
        fn test_aborted_report_never_passes() {
            let mut report = SuiteReport::new("leaky");
            report.aborted = true;
            assert!(!report.all_passed());
            assert!(report.summary().contains("aborted"));
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_text() {
            let text = sample_report().render_text();
            assert!(text.contains("PASS about link (1200 ms) -> https://saucelabs.com/"));
            assert!(text.contains("FAIL twitter link"));
            assert!(text.contains("SKIP linkedin link"));
            assert!(text.ends_with("saucedemo: 1/4 passed, 2 failed, 1 skipped\n"));
        }

        #[test]
        fn test_render_json() {
            let json = sample_report().render_json().unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["suite_name"], "saucedemo");
            assert_eq!(value["results"][0]["status"], "passed");
            assert_eq!(value["results"][0]["duration"], 1200);
            assert_eq!(value["results"][1]["error_kind"], "domain_mismatch");
        }

        #[test]
        fn test_render_junit_splits_failures_and_errors() {
            let xml = sample_report().render_junit();
            assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
            assert!(xml.contains(r#"tests="4" failures="1" errors="1" skipped="1""#));
            assert!(xml.contains(r#"<failure type="domain_mismatch""#));
            assert!(xml.contains(r#"<error type="driver""#));
            assert!(xml.contains("<skipped message=\"run aborted\"/>"));
        }

        #[test]
        fn test_junit_escapes_names() {
            let mut report = SuiteReport::new("a&b");
            report.record(CaseResult::passed("<link>", Duration::ZERO, "https://x.example/"));
            let xml = report.render_junit();
            assert!(xml.contains("a&amp;b"));
            assert!(xml.contains("&lt;link&gt;"));
        }

        #[test]
        fn test_write_to_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("report.xml");
            sample_report().write_to(&path, ReportFormat::Junit).unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert!(written.contains("<testsuite"));
        }
    }

    #[test]
    fn test_failure_mode_default() {
        assert_eq!(FailureMode::default(), FailureMode::CollectAll);
    }
}
