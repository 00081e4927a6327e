//! Terminal output for case results and summaries

use console::{style, Style, Term};
use navprobe::{CaseResult, CaseStatus, SuiteReport};

/// Writes progress lines to stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("-").yellow().bold().to_string()
        } else {
            "SKIP".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one case line
    pub fn case(&self, result: &CaseResult) {
        let millis = result.duration.as_millis();
        match result.status {
            CaseStatus::Passed => {
                let target = result.final_url.as_deref().unwrap_or_default();
                self.success(&format!("{} ({millis} ms) -> {target}", result.name));
            }
            CaseStatus::Failed => {
                let error = result.error.as_deref().unwrap_or("unknown error");
                self.failure(&format!("{} ({millis} ms): {error}", result.name));
            }
            CaseStatus::Skipped => {
                let reason = result.error.as_deref().unwrap_or_default();
                self.skipped(&format!("{} ({reason})", result.name));
            }
        }
    }

    /// Print every case of a report, then its summary
    pub fn report(&self, report: &SuiteReport) {
        self.header(&report.suite_name);
        for result in &report.results {
            self.case(result);
        }
        self.summary(report);
    }

    /// Print the suite summary line
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let passed = report.passed_count();
        let skipped = report.skipped_count();
        let duration_secs = report.total_duration().as_secs_f64();
        let total = report.total_count();
        let ok = report.all_passed();

        let _ = self.term.write_line("");
        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if report.aborted {
                failed_style.apply_to("ABORTED")
            } else if ok {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} links in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if report.aborted {
                "ABORTED"
            } else if ok {
                "PASSED"
            } else {
                "FAILED"
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} links in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}
