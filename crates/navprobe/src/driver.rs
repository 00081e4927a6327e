//! BrowsingSession - abstract automation session
//!
//! The verifier and the suite runner only talk to this trait. The browser
//! itself (process launch, DOM queries, CDP transport) belongs to whatever
//! implements it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowsingSession (trait)                                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐    │
//! │  │  ChromiumSession     │        │  MockSession         │    │
//! │  │  (feature "browser") │        │  (unit tests)        │    │
//! │  │  CDP via chromiumoxide│       │  scripted contexts   │    │
//! │  └──────────────────────┘        └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session has any number of open browsing contexts (tabs/windows) and
//! exactly one active context that receives commands.

use crate::result::NavResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Opaque identifier of one open tab or window
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextHandle(String);

impl ContextHandle {
    /// Wrap a driver-specific identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of open context handles, ordered for stable set differences
pub type HandleSet = BTreeSet<ContextHandle>;

/// An element already located on the active page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Selector the element was found with
    pub selector: String,
    /// Element tag name
    pub tag_name: String,
    /// Raw `href` attribute as read at lookup time
    pub href: Option<String>,
}

impl ElementRef {
    /// Create a new element reference
    #[must_use]
    pub fn new(selector: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag_name: tag_name.into(),
            href: None,
        }
    }

    /// Attach the raw href attribute
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

/// Browser configuration for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// User agent string
    pub user_agent: Option<String>,
    /// Timeout for page loads
    pub navigation_timeout: Duration,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl SessionConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Automation session consumed by the verifier
///
/// Implementations are exclusively borrowed (`&mut self`) for the length of
/// one verification: there is a single active-context pointer per session.
#[async_trait]
pub trait BrowsingSession: Send {
    /// Load `url` in the active context
    async fn navigate(&mut self, url: &str) -> NavResult<()>;

    /// Go back in the active context's history
    async fn go_back(&mut self) -> NavResult<()>;

    /// Location of the active context
    async fn current_url(&mut self) -> NavResult<String>;

    /// All currently open contexts
    async fn window_handles(&mut self) -> NavResult<HandleSet>;

    /// The context currently receiving commands
    async fn active_handle(&mut self) -> NavResult<ContextHandle>;

    /// Make `handle` the active context
    async fn switch_to(&mut self, handle: &ContextHandle) -> NavResult<()>;

    /// Close the active context. No context is active until the next `switch_to`.
    async fn close_active(&mut self) -> NavResult<()>;

    /// Locate an element on the active page
    async fn find_element(&mut self, selector: &str) -> NavResult<ElementRef>;

    /// Whether the element is attached, visible and enabled
    async fn is_interactable(&mut self, element: &ElementRef) -> NavResult<bool>;

    /// Click the element
    async fn click(&mut self, element: &ElementRef) -> NavResult<()>;

    /// Shut the browser down
    async fn quit(&mut self) -> NavResult<()>;
}
