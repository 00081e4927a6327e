//! Smoke tests for the navprobe CLI
//!
//! These exercise argument parsing and suite validation; nothing here
//! launches a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the navprobe binary
fn navprobe() -> Command {
    Command::cargo_bin("navprobe").expect("navprobe binary should exist")
}

const GOOD_SUITE: &str = r##"
name: saucedemo
cases:
  - name: about link
    url: https://www.saucedemo.com/v1/inventory.html
    selector: "#about_sidebar_link"
    expected_host: saucelabs.com
  - name: twitter
    url: https://www.saucedemo.com/v1/inventory.html
    selector: ".social_twitter a"
    expected_host: twitter.com
"##;

const DUPLICATE_SUITE: &str = r##"
name: broken
cases:
  - name: same
    url: https://a.example/
    selector: a
  - name: same
    url: https://a.example/
    selector: b
"##;

fn write_suite(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    navprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    navprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_no_args_fails() {
    navprobe().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    navprobe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_check_requires_expected_host() {
    navprobe()
        .args(["check", "https://a.example/", "#link"])
        .assert()
        .failure();
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_good_suite() {
    let dir = TempDir::new().unwrap();
    let path = write_suite(&dir, "good.yaml", GOOD_SUITE);
    navprobe()
        .args(["--color", "never", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("suite 'saucedemo' with 2 cases"));
}

#[test]
fn test_validate_duplicate_names() {
    let dir = TempDir::new().unwrap();
    let path = write_suite(&dir, "broken.yaml", DUPLICATE_SUITE);
    navprobe()
        .args(["--color", "never", "validate"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("duplicate case name"));
}

#[test]
fn test_validate_missing_file() {
    navprobe()
        .args(["validate", "/nonexistent/suite.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 of 1 suite files are invalid"));
}

#[test]
fn test_validate_shipped_suites() {
    let suites = concat!(env!("CARGO_MANIFEST_DIR"), "/../../suites");
    let mut paths: Vec<_> = fs::read_dir(suites)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty());
    navprobe().arg("validate").args(&paths).assert().success();
}

#[test]
fn test_run_rejects_invalid_suite_before_launching() {
    let dir = TempDir::new().unwrap();
    let path = write_suite(&dir, "broken.yaml", DUPLICATE_SUITE);
    navprobe()
        .args(["--color", "never", "run"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_run_rejects_zero_timeout() {
    navprobe()
        .args(["run", "suites/saucedemo.yaml", "--timeout-ms", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout-ms"));
}
