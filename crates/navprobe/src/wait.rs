//! Bounded waits over a [`BrowsingSession`].
//!
//! Waiting is cooperative polling: probe, sleep one interval, probe again,
//! until the deadline. The last probe happens at the deadline itself, so a
//! condition that becomes true just in time is still observed.

use crate::driver::BrowsingSession;
use crate::result::NavResult;
use crate::target::ExpectedHost;
use std::time::{Duration, Instant};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Deadline-bound poll clock
#[derive(Debug)]
pub struct Poller {
    start: Instant,
    timeout: Duration,
    interval: Duration,
    polls: u32,
}

impl Poller {
    /// Start the clock now
    #[must_use]
    pub fn new(options: &WaitOptions) -> Self {
        Self {
            start: Instant::now(),
            timeout: options.timeout(),
            // a zero interval would spin the executor
            interval: options.poll_interval().max(Duration::from_millis(1)),
            polls: 0,
        }
    }

    /// Time since the clock started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Number of completed sleeps
    #[must_use]
    pub const fn polls(&self) -> u32 {
        self.polls
    }

    /// Sleep until the next probe. Returns `false` once the deadline has passed.
    pub async fn tick(&mut self) -> bool {
        let remaining = self.timeout.saturating_sub(self.start.elapsed());
        if remaining.is_zero() {
            return false;
        }
        tokio::time::sleep(self.interval.min(remaining)).await;
        self.polls += 1;
        true
    }
}

/// Outcome of waiting for the active context to reach a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlWait {
    /// The active context reached the expected host
    Matched {
        /// URL that matched
        url: String,
        /// Time spent waiting
        elapsed: Duration,
    },
    /// The deadline passed first
    TimedOut {
        /// Last URL observed
        last_url: String,
        /// Time spent waiting
        elapsed: Duration,
    },
}

/// Wait for the active context's location to match `expected`
pub async fn wait_for_host<S>(
    session: &mut S,
    expected: &ExpectedHost,
    options: &WaitOptions,
) -> NavResult<UrlWait>
where
    S: BrowsingSession + ?Sized,
{
    let mut poller = Poller::new(options);
    loop {
        let url = session.current_url().await?;
        if expected.matches(&url) {
            return Ok(UrlWait::Matched {
                url,
                elapsed: poller.elapsed(),
            });
        }
        if !poller.tick().await {
            return Ok(UrlWait::TimedOut {
                last_url: url,
                elapsed: poller.elapsed(),
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{LinkBehavior, MockLink, MockSession};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_builder() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(5);
            assert_eq!(opts.timeout(), Duration::from_millis(250));
            assert_eq!(opts.poll_interval(), Duration::from_millis(5));
        }
    }

    mod poller_tests {
        use super::*;

        #[tokio::test]
        async fn test_tick_stops_after_deadline() {
            let opts = WaitOptions::new().with_timeout(30).with_poll_interval(10);
            let mut poller = Poller::new(&opts);
            while poller.tick().await {}
            assert!(poller.elapsed() >= Duration::from_millis(30));
            assert!(poller.polls() >= 1);
        }

        #[tokio::test]
        async fn test_zero_timeout_never_sleeps() {
            let opts = WaitOptions::new().with_timeout(0);
            let mut poller = Poller::new(&opts);
            assert!(!poller.tick().await);
            assert_eq!(poller.polls(), 0);
        }
    }

    mod wait_for_host_tests {
        use super::*;

        #[tokio::test]
        async fn test_matches_immediately() {
            let mut session = MockSession::new("https://www.saucedemo.com/v1/index.html");
            let expected = ExpectedHost::parse("saucedemo.com").unwrap();
            let opts = WaitOptions::new().with_timeout(50).with_poll_interval(5);

            let outcome = wait_for_host(&mut session, &expected, &opts).await.unwrap();
            assert!(matches!(outcome, UrlWait::Matched { .. }));
        }

        #[tokio::test]
        async fn test_times_out_with_last_url() {
            let mut session = MockSession::new("https://site.example/form");
            let expected = ExpectedHost::parse("github.com").unwrap();
            let opts = WaitOptions::new().with_timeout(20).with_poll_interval(5);

            match wait_for_host(&mut session, &expected, &opts).await.unwrap() {
                UrlWait::TimedOut { last_url, .. } => {
                    assert_eq!(last_url, "https://site.example/form");
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_matches_after_delayed_navigation() {
            let mut session = MockSession::new("https://site.example/form");
            session.add_link(MockLink::new(
                "#docs",
                "https://docs.example/",
                LinkBehavior::NavigateInPlace { delay_polls: 3 },
            ));
            let link = session.find_element("#docs").await.unwrap();
            session.click(&link).await.unwrap();

            let expected = ExpectedHost::parse("docs.example").unwrap();
            let opts = WaitOptions::new().with_timeout(500).with_poll_interval(5);
            let outcome = wait_for_host(&mut session, &expected, &opts).await.unwrap();
            assert!(matches!(outcome, UrlWait::Matched { ref url, .. } if url == "https://docs.example/"));
        }
    }
}
