//! Result and error types for navprobe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for navprobe operations
pub type NavResult<T> = Result<T, NavError>;

/// Errors that can occur while driving a session or verifying a link
#[derive(Debug, Error)]
pub enum NavError {
    /// The link could not be clicked when the verifier was called
    #[error("Element {selector} is not interactable: {reason}")]
    ElementNotInteractable {
        /// Selector of the link
        selector: String,
        /// Why the element was rejected (hidden, disabled, detached)
        reason: String,
    },

    /// Neither a new context nor a matching in-place navigation appeared in time
    #[error("No navigation to {expected_host} within {timeout_ms}ms")]
    NavigationTimeout {
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Host the navigation should have reached
        expected_host: String,
    },

    /// Navigation happened but ended on the wrong host
    #[error("Expected host {expected} but navigation ended at {actual_url}")]
    DomainMismatch {
        /// Expected host
        expected: String,
        /// URL that was actually reached
        actual_url: String,
    },

    /// The session was left with extra contexts or the wrong active context
    #[error("Browsing context leak: {message}")]
    HandleLeak {
        /// What was left behind
        message: String,
    },

    /// Browser executable not found
    #[error("Browser not found. Install Chromium or pass --chromium")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Session-level driver failure
    #[error("Session error: {message}")]
    SessionError {
        /// Error message
        message: String,
    },

    /// Selector did not match anything on the page
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector that failed
        selector: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// URL or href could not be parsed
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Parser message
        message: String,
    },

    /// Suite or session configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Stable classification of a [`NavError`], used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Link not clickable
    ElementNotInteractable,
    /// Nothing happened in time
    NavigationTimeout,
    /// Wrong destination
    DomainMismatch,
    /// Session state corrupted
    HandleLeak,
    /// Any driver, configuration or I/O failure
    Driver,
}

impl ErrorKind {
    /// Name used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ElementNotInteractable => "element_not_interactable",
            Self::NavigationTimeout => "navigation_timeout",
            Self::DomainMismatch => "domain_mismatch",
            Self::HandleLeak => "handle_leak",
            Self::Driver => "driver",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NavError {
    /// Create a session error
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::SessionError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a handle leak error
    #[must_use]
    pub fn handle_leak(message: impl Into<String>) -> Self {
        Self::HandleLeak {
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ElementNotInteractable { .. } => ErrorKind::ElementNotInteractable,
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            Self::DomainMismatch { .. } => ErrorKind::DomainMismatch,
            Self::HandleLeak { .. } => ErrorKind::HandleLeak,
            _ => ErrorKind::Driver,
        }
    }

    /// A leaked context corrupts every later check on the same session,
    /// so the remainder of the run must stop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::HandleLeak { .. })
    }
}
