//! Session ownership for a run.
//!
//! A [`SessionFixture`] owns one [`BrowsingSession`] for the lifetime of a
//! run and lends it out by `&mut`. Nothing holds the session globally, so
//! two runs never share a browser by accident. `teardown` quits the session
//! exactly once; dropping an open fixture logs a warning because async
//! cleanup cannot run in `Drop`.
//!
//! ```ignore
//! let mut fixture = SessionFixture::new(ChromiumSession::launch(config).await?);
//! let report = SuiteRunner::new().run(fixture.session_mut()?, &suite).await;
//! fixture.teardown().await?;
//! ```

use crate::driver::BrowsingSession;
use crate::result::{NavError, NavResult};
use tracing::{debug, warn};

/// Lifecycle state of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Session is open and may be used
    Open,
    /// Session was quit
    TornDown,
    /// Quitting the session failed
    Failed,
}

/// Owns a session until teardown
#[derive(Debug)]
pub struct SessionFixture<S: BrowsingSession> {
    session: S,
    state: FixtureState,
}

impl<S: BrowsingSession> SessionFixture<S> {
    /// Take ownership of an open session
    #[must_use]
    pub const fn new(session: S) -> Self {
        Self {
            session,
            state: FixtureState::Open,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> FixtureState {
        self.state
    }

    /// Borrow the session for a verification or a suite run
    pub fn session_mut(&mut self) -> NavResult<&mut S> {
        match self.state {
            FixtureState::Open => Ok(&mut self.session),
            FixtureState::TornDown | FixtureState::Failed => {
                Err(NavError::session("session fixture already torn down"))
            }
        }
    }

    /// Borrow the session read-only, in any state
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Quit the session. Calling it again is a no-op.
    pub async fn teardown(&mut self) -> NavResult<()> {
        if self.state != FixtureState::Open {
            return Ok(());
        }
        debug!("tearing down session fixture");
        match self.session.quit().await {
            Ok(()) => {
                self.state = FixtureState::TornDown;
                Ok(())
            }
            Err(e) => {
                self.state = FixtureState::Failed;
                Err(e)
            }
        }
    }
}

impl<S: BrowsingSession> Drop for SessionFixture<S> {
    fn drop(&mut self) {
        if self.state == FixtureState::Open {
            warn!("session fixture dropped without teardown; browser may still be running");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockSession;

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_new_fixture_is_open() {
            let mut fixture = SessionFixture::new(MockSession::new("about:blank"));
            assert_eq!(fixture.state(), FixtureState::Open);
            let url = fixture.session_mut().unwrap().current_url().await.unwrap();
            assert_eq!(url, "about:blank");
        }

        #[tokio::test]
        async fn test_teardown_quits_once() {
            let mut fixture = SessionFixture::new(MockSession::new("about:blank"));
            fixture.teardown().await.unwrap();
            fixture.teardown().await.unwrap();
            assert_eq!(fixture.state(), FixtureState::TornDown);
            let quits = fixture
                .session()
                .history()
                .iter()
                .filter(|c| *c == "quit")
                .count();
            assert_eq!(quits, 1);
        }

        #[tokio::test]
        async fn test_session_unavailable_after_teardown() {
            let mut fixture = SessionFixture::new(MockSession::new("about:blank"));
            fixture.teardown().await.unwrap();
            assert!(matches!(
                fixture.session_mut(),
                Err(NavError::SessionError { .. })
            ));
        }
    }
}
