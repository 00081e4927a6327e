//! External navigation verifier.
//!
//! Clicks a link and confirms it lands on the expected host, whether the
//! link opens a new tab/window or navigates the current one:
//!
//! ```text
//!   record handles + active ──► click ──► poll ─┬─ handle set grew ──► switch, wait host, assert
//!                                               ├─ active URL matches ──► assert
//!                                               └─ deadline ──► timeout / mismatch
//!                                                        │
//!                     close new contexts, refocus original, return to origin
//!                                                        │
//!                        postcondition: same handle set, original active
//! ```
//!
//! Cleanup runs on every exit path. A failed postcondition is reported as
//! [`NavError::HandleLeak`], which outranks whatever the check itself found.

use crate::driver::{BrowsingSession, ContextHandle, ElementRef, HandleSet};
use crate::result::{NavError, NavResult};
use crate::target::{host_of, same_document, ExpectedHost};
use crate::wait::{wait_for_host, Poller, UrlWait, WaitOptions, DEFAULT_POLL_INTERVAL_MS};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Options for one verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Maximum wait for navigation, and again for the new context to load
    pub timeout: Duration,
    /// Delay between polls
    pub poll_interval: Duration,
    /// Put the original context back on the page it started from
    pub return_to_origin: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            return_to_origin: true,
        }
    }
}

impl VerifyOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Choose whether to navigate back after a same-context check
    #[must_use]
    pub const fn with_return_to_origin(mut self, enabled: bool) -> Self {
        self.return_to_origin = enabled;
        self
    }

    fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.timeout.as_millis() as u64)
            .with_poll_interval(self.poll_interval.as_millis() as u64)
    }
}

/// Where the navigation happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// The link opened a new tab/window (since closed)
    NewContext {
        /// Handle of the context that was checked
        handle: ContextHandle,
    },
    /// The link navigated the original context
    SameContext,
}

/// A successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Which branch succeeded
    pub outcome: NavigationOutcome,
    /// URL that satisfied the expectation
    pub final_url: String,
    /// Time from click to verdict
    pub elapsed: Duration,
}

/// Verify `link` with default options and the given timeout
pub async fn verify<S>(
    session: &mut S,
    link: &ElementRef,
    expected: &ExpectedHost,
    timeout: Duration,
) -> NavResult<Verification>
where
    S: BrowsingSession + ?Sized,
{
    NavigationVerifier::new(VerifyOptions::new().with_timeout(timeout))
        .verify(session, link, expected)
        .await
}

/// Snapshot of the session taken before the click
#[derive(Debug)]
struct Origin {
    handles: HandleSet,
    active: ContextHandle,
    url: String,
}

/// Runs the click-wait-assert-cleanup protocol
#[derive(Debug, Clone, Default)]
pub struct NavigationVerifier {
    options: VerifyOptions,
}

impl NavigationVerifier {
    /// Create a verifier
    #[must_use]
    pub const fn new(options: VerifyOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Click `link` and confirm it reaches `expected`, then restore the session
    #[instrument(skip(self, session, link, expected), fields(selector = %link.selector, expected = %expected))]
    pub async fn verify<S>(
        &self,
        session: &mut S,
        link: &ElementRef,
        expected: &ExpectedHost,
    ) -> NavResult<Verification>
    where
        S: BrowsingSession + ?Sized,
    {
        let origin = Origin {
            handles: session.window_handles().await?,
            active: session.active_handle().await?,
            url: session.current_url().await?,
        };
        if origin.handles.len() != 1 {
            warn!(
                open = origin.handles.len(),
                "verifying with more than one open context"
            );
        }

        if !session.is_interactable(link).await? {
            return Err(NavError::ElementNotInteractable {
                selector: link.selector.clone(),
                reason: "element is not visible or not enabled".to_string(),
            });
        }

        let start = Instant::now();
        let checked = self.click_and_check(session, link, expected, &origin, start).await;
        let restored = self.restore(session, &origin).await;

        match (checked, restored) {
            (Ok(verification), Ok(())) => {
                debug!(url = %verification.final_url, elapsed_ms = verification.elapsed.as_millis() as u64, "link verified");
                Ok(verification)
            }
            (_, Err(leak)) => Err(leak),
            (Err(err), Ok(())) => Err(err),
        }
    }

    async fn click_and_check<S>(
        &self,
        session: &mut S,
        link: &ElementRef,
        expected: &ExpectedHost,
        origin: &Origin,
        start: Instant,
    ) -> NavResult<Verification>
    where
        S: BrowsingSession + ?Sized,
    {
        session.click(link).await?;
        debug!("clicked");

        let mut poller = Poller::new(&self.options.wait_options());
        let last_url = loop {
            let handles = session.window_handles().await?;
            // No ordering among new handles is assumed; any one of them will do.
            if let Some(handle) = handles.difference(&origin.handles).next().cloned() {
                debug!(%handle, "new context opened");
                return self.check_new_context(session, handle, expected, start).await;
            }

            let url = session.current_url().await?;
            if !same_document(&url, &origin.url) && expected.matches(&url) {
                debug!(%url, "navigated in place");
                return Ok(Verification {
                    outcome: NavigationOutcome::SameContext,
                    final_url: url,
                    elapsed: start.elapsed(),
                });
            }
            if !poller.tick().await {
                break url;
            }
        };

        if same_document(&last_url, &origin.url) {
            Err(NavError::NavigationTimeout {
                timeout_ms: self.options.timeout.as_millis() as u64,
                expected_host: expected.to_string(),
            })
        } else {
            Err(NavError::DomainMismatch {
                expected: expected.to_string(),
                actual_url: last_url,
            })
        }
    }

    async fn check_new_context<S>(
        &self,
        session: &mut S,
        handle: ContextHandle,
        expected: &ExpectedHost,
        start: Instant,
    ) -> NavResult<Verification>
    where
        S: BrowsingSession + ?Sized,
    {
        session.switch_to(&handle).await?;
        match wait_for_host(session, expected, &self.options.wait_options()).await? {
            UrlWait::Matched { url, .. } => Ok(Verification {
                outcome: NavigationOutcome::NewContext { handle },
                final_url: url,
                elapsed: start.elapsed(),
            }),
            // a tab that never left about:blank did not navigate anywhere
            UrlWait::TimedOut { last_url, .. } if host_of(&last_url).is_none() => {
                Err(NavError::NavigationTimeout {
                    timeout_ms: self.options.timeout.as_millis() as u64,
                    expected_host: expected.to_string(),
                })
            }
            UrlWait::TimedOut { last_url, .. } => Err(NavError::DomainMismatch {
                expected: expected.to_string(),
                actual_url: last_url,
            }),
        }
    }

    /// Close new contexts, refocus the original, optionally return to the
    /// original page, then check the postcondition. Any failure here is a leak.
    async fn restore<S>(&self, session: &mut S, origin: &Origin) -> NavResult<()>
    where
        S: BrowsingSession + ?Sized,
    {
        self.close_new_contexts(session, origin)
            .await
            .map_err(|e| NavError::handle_leak(format!("cleanup failed: {e}")))?;

        if self.options.return_to_origin {
            self.return_to_origin(session, origin)
                .await
                .map_err(|e| NavError::handle_leak(format!("could not return to {}: {e}", origin.url)))?;
        }

        let after = session
            .window_handles()
            .await
            .map_err(|e| NavError::handle_leak(format!("cannot list contexts: {e}")))?;
        if after != origin.handles {
            let extra: Vec<&str> = after
                .difference(&origin.handles)
                .map(ContextHandle::as_str)
                .collect();
            let missing: Vec<&str> = origin
                .handles
                .difference(&after)
                .map(ContextHandle::as_str)
                .collect();
            warn!(?extra, ?missing, "context set changed");
            return Err(NavError::handle_leak(format!(
                "{} contexts open, expected {} (extra: {:?}, missing: {:?})",
                after.len(),
                origin.handles.len(),
                extra,
                missing
            )));
        }

        let active = session
            .active_handle()
            .await
            .map_err(|e| NavError::handle_leak(format!("no active context: {e}")))?;
        if active != origin.active {
            warn!(%active, original = %origin.active, "wrong active context");
            return Err(NavError::handle_leak(format!(
                "active context is {active}, expected {}",
                origin.active
            )));
        }
        Ok(())
    }

    async fn close_new_contexts<S>(&self, session: &mut S, origin: &Origin) -> NavResult<()>
    where
        S: BrowsingSession + ?Sized,
    {
        let handles = session.window_handles().await?;
        for handle in handles.difference(&origin.handles) {
            debug!(%handle, "closing context");
            session.switch_to(handle).await?;
            session.close_active().await?;
        }
        session.switch_to(&origin.active).await
    }

    async fn return_to_origin<S>(&self, session: &mut S, origin: &Origin) -> NavResult<()>
    where
        S: BrowsingSession + ?Sized,
    {
        if session.current_url().await? == origin.url {
            return Ok(());
        }

        session.go_back().await?;
        let mut poller = Poller::new(&self.options.wait_options());
        loop {
            if session.current_url().await? == origin.url {
                debug!("returned to origin via history");
                return Ok(());
            }
            if !poller.tick().await {
                break;
            }
        }

        debug!(url = %origin.url, "history did not return to origin, navigating to it");
        session.navigate(&origin.url).await
    }
}
