//! Navprobe: cross-window link verification for browser end-to-end checks
//!
//! Clicks a link on a third-party page and proves it reached the expected
//! external host, whether it opened a new tab/window or navigated the
//! current one, then puts the session back exactly as it was.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    NAVPROBE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ LinkSuite  │    │ Navigation │    │ Browsing   │            │
//! │   │ (YAML)     │───►│ Verifier   │───►│ Session    │            │
//! │   │            │    │            │    │ (chromium) │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                 │                 ▲                   │
//! │         ▼                 ▼                 │                   │
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ SuiteReport│    │ Expected   │    │ Mock       │            │
//! │   │ text/json/ │    │ Host       │    │ Session    │            │
//! │   │ junit      │    │            │    │ (tests)    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use navprobe::{ExpectedHost, NavigationVerifier, VerifyOptions};
//!
//! let link = session.find_element("#about_sidebar_link").await?;
//! let expected = ExpectedHost::parse("saucelabs.com")?;
//! let verification = NavigationVerifier::new(VerifyOptions::default())
//!     .verify(&mut session, &link, &expected)
//!     .await?;
//! println!("landed on {}", verification.final_url);
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_frames))]

/// Chromium session over CDP
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod browser;

#[allow(clippy::missing_errors_doc)]
mod driver;

/// Session fixture with guaranteed teardown
#[allow(clippy::missing_errors_doc)]
pub mod fixture;

/// Scripted in-memory session for tests
#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
pub mod mock;

#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod reporter;
mod result;

/// Link suites and the suite runner
#[allow(clippy::missing_errors_doc)]
pub mod suite;

#[allow(clippy::missing_errors_doc)]
mod target;

#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod verifier;

/// Bounded polling waits
#[allow(clippy::missing_errors_doc)]
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::ChromiumSession;
pub use driver::{BrowsingSession, ContextHandle, ElementRef, HandleSet, SessionConfig};
pub use fixture::{FixtureState, SessionFixture};
pub use mock::{LinkBehavior, MockLink, MockSession};
pub use reporter::{CaseResult, CaseStatus, FailureMode, ReportFormat, SuiteReport};
pub use result::{ErrorKind, NavError, NavResult};
pub use suite::{LinkCase, LinkSuite, SuiteDefaults, SuiteRunner};
pub use target::{host_of, resolve_href, same_document, ExpectedHost};
pub use verifier::{verify, NavigationOutcome, NavigationVerifier, Verification, VerifyOptions};
pub use wait::{wait_for_host, Poller, UrlWait, WaitOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        BrowsingSession, CaseStatus, ExpectedHost, LinkCase, LinkSuite, NavError, NavResult,
        NavigationOutcome, NavigationVerifier, SessionConfig, SessionFixture, SuiteReport,
        SuiteRunner, Verification, VerifyOptions,
    };
}
