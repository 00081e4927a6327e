//! Scripted in-memory session for unit tests.
//!
//! `MockSession` keeps a set of contexts, each with its own history, and a
//! table of links whose click behavior is scripted with [`LinkBehavior`].
//! Effects of a click can be delayed by a number of observations: every
//! call to `current_url` or `window_handles` advances pending effects by one
//! step, the way a real page finishes loading between polls.

use crate::driver::{BrowsingSession, ContextHandle, ElementRef, HandleSet};
use crate::result::{NavError, NavResult};
use crate::target::resolve_href;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// What clicking a mock link does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkBehavior {
    /// Open the target in a new tab after `delay_polls` observations
    OpenInNewContext {
        /// Observations before the tab appears
        delay_polls: u32,
    },
    /// Open the target plus extra URLs, each in its own tab
    OpenMultipleContexts {
        /// Additional URLs opened by the same click
        extra_urls: Vec<String>,
    },
    /// Navigate the active context after `delay_polls` observations
    NavigateInPlace {
        /// Observations before the location changes
        delay_polls: u32,
    },
    /// Open the target in a new tab that ignores close requests
    OpenAndLeak,
    /// Dead link: nothing observable happens
    NoOp,
}

/// A link registered on the mock page
#[derive(Debug, Clone)]
pub struct MockLink {
    /// Selector the link answers to
    pub selector: String,
    /// Raw href attribute (may be relative)
    pub href: String,
    /// Click behavior
    pub behavior: LinkBehavior,
    /// Element is rendered
    pub visible: bool,
    /// Element accepts clicks
    pub enabled: bool,
}

impl MockLink {
    /// Create a visible, enabled link
    #[must_use]
    pub fn new(selector: impl Into<String>, href: impl Into<String>, behavior: LinkBehavior) -> Self {
        Self {
            selector: selector.into(),
            href: href.into(),
            behavior,
            visible: true,
            enabled: true,
        }
    }

    /// Mark the link hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark the link disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone)]
struct MockContext {
    history: Vec<String>,
    pending: Option<(String, u32)>,
    closable: bool,
}

impl MockContext {
    fn new(url: impl Into<String>) -> Self {
        Self {
            history: vec![url.into()],
            pending: None,
            closable: true,
        }
    }

    fn url(&self) -> &str {
        self.history.last().map_or("about:blank", String::as_str)
    }
}

#[derive(Debug, Clone)]
struct PendingOpen {
    urls: Vec<String>,
    polls_left: u32,
    closable: bool,
}

/// In-memory [`BrowsingSession`]
#[derive(Debug, Default)]
pub struct MockSession {
    contexts: BTreeMap<ContextHandle, MockContext>,
    active: Option<ContextHandle>,
    next_id: u32,
    links: HashMap<String, MockLink>,
    pending_opens: Vec<PendingOpen>,
    history_frozen: bool,
    current_url_calls: u32,
    fail_current_url_on: Option<u32>,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl MockSession {
    /// Create a session with one context showing `start_url`
    #[must_use]
    pub fn new(start_url: &str) -> Self {
        let mut session = Self::default();
        let handle = session.open_context(start_url, true);
        session.active = Some(handle);
        session
    }

    /// Make `go_back` a no-op, like a page that replaced its history entry
    #[must_use]
    pub const fn with_frozen_history(mut self) -> Self {
        self.history_frozen = true;
        self
    }

    /// Fail the `call`-th `current_url` request (1-based) with a driver error
    #[must_use]
    pub const fn failing_current_url_on(mut self, call: u32) -> Self {
        self.fail_current_url_on = Some(call);
        self
    }

    /// Register a link on the page
    pub fn add_link(&mut self, link: MockLink) {
        let _ = self.links.insert(link.selector.clone(), link);
    }

    /// Number of open contexts
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Location of the active context, without advancing pending effects
    #[must_use]
    pub fn active_url(&self) -> Option<&str> {
        self.active
            .as_ref()
            .and_then(|h| self.contexts.get(h))
            .map(MockContext::url)
    }

    /// Active handle, without advancing pending effects
    #[must_use]
    pub const fn active(&self) -> Option<&ContextHandle> {
        self.active.as_ref()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn open_context(&mut self, url: &str, closable: bool) -> ContextHandle {
        self.next_id += 1;
        let handle = ContextHandle::new(format!("ctx-{}", self.next_id));
        let mut context = MockContext::new(url);
        context.closable = closable;
        let _ = self.contexts.insert(handle.clone(), context);
        handle
    }

    fn active_context_mut(&mut self) -> NavResult<&mut MockContext> {
        let handle = self
            .active
            .as_ref()
            .ok_or_else(|| NavError::session("no active context"))?;
        self.contexts
            .get_mut(handle)
            .ok_or_else(|| NavError::session(format!("context {handle} is closed")))
    }

    /// One observation step: apply or count down pending effects
    fn advance(&mut self) {
        for context in self.contexts.values_mut() {
            if let Some((url, polls_left)) = context.pending.take() {
                if polls_left == 0 {
                    context.history.push(url);
                } else {
                    context.pending = Some((url, polls_left - 1));
                }
            }
        }

        let pending = std::mem::take(&mut self.pending_opens);
        for mut open in pending {
            if open.polls_left == 0 {
                for url in &open.urls {
                    let _ = self.open_context(url, open.closable);
                }
            } else {
                open.polls_left -= 1;
                self.pending_opens.push(open);
            }
        }
    }
}

#[async_trait]
impl BrowsingSession for MockSession {
    async fn navigate(&mut self, url: &str) -> NavResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        let context = self.active_context_mut()?;
        context.pending = None;
        context.history.push(url.to_string());
        Ok(())
    }

    async fn go_back(&mut self) -> NavResult<()> {
        self.call_history.push("go_back".to_string());
        let frozen = self.history_frozen;
        let context = self.active_context_mut()?;
        context.pending = None;
        if !frozen && context.history.len() > 1 {
            let _ = context.history.pop();
        }
        Ok(())
    }

    async fn current_url(&mut self) -> NavResult<String> {
        self.advance();
        self.current_url_calls += 1;
        if self.fail_current_url_on == Some(self.current_url_calls) {
            return Err(NavError::session("target crashed while reading location"));
        }
        let context = self.active_context_mut()?;
        Ok(context.url().to_string())
    }

    async fn window_handles(&mut self) -> NavResult<HandleSet> {
        self.advance();
        Ok(self.contexts.keys().cloned().collect())
    }

    async fn active_handle(&mut self) -> NavResult<ContextHandle> {
        self.active
            .clone()
            .ok_or_else(|| NavError::session("no active context"))
    }

    async fn switch_to(&mut self, handle: &ContextHandle) -> NavResult<()> {
        self.call_history.push(format!("switch_to:{handle}"));
        if !self.contexts.contains_key(handle) {
            return Err(NavError::session(format!("no such context {handle}")));
        }
        self.active = Some(handle.clone());
        Ok(())
    }

    async fn close_active(&mut self) -> NavResult<()> {
        let handle = self
            .active
            .take()
            .ok_or_else(|| NavError::session("no active context"))?;
        self.call_history.push(format!("close:{handle}"));
        let closable = self.contexts.get(&handle).map_or(true, |c| c.closable);
        if closable {
            let _ = self.contexts.remove(&handle);
        }
        Ok(())
    }

    async fn find_element(&mut self, selector: &str) -> NavResult<ElementRef> {
        let link = self
            .links
            .get(selector)
            .ok_or_else(|| NavError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        Ok(ElementRef::new(selector, "a").with_href(link.href.clone()))
    }

    async fn is_interactable(&mut self, element: &ElementRef) -> NavResult<bool> {
        Ok(self
            .links
            .get(&element.selector)
            .is_some_and(|l| l.visible && l.enabled))
    }

    async fn click(&mut self, element: &ElementRef) -> NavResult<()> {
        self.call_history.push(format!("click:{}", element.selector));
        let link = self
            .links
            .get(&element.selector)
            .cloned()
            .ok_or_else(|| NavError::ElementNotFound {
                selector: element.selector.clone(),
            })?;
        if !(link.visible && link.enabled) {
            return Err(NavError::ElementNotInteractable {
                selector: link.selector,
                reason: "element is hidden or disabled".to_string(),
            });
        }

        let base = self.active_context_mut()?.url().to_string();
        let target = resolve_href(&base, &link.href)?.to_string();

        match link.behavior {
            LinkBehavior::OpenInNewContext { delay_polls } => {
                self.pending_opens.push(PendingOpen {
                    urls: vec![target],
                    polls_left: delay_polls,
                    closable: true,
                });
            }
            LinkBehavior::OpenMultipleContexts { extra_urls } => {
                let mut urls = vec![target];
                urls.extend(extra_urls);
                self.pending_opens.push(PendingOpen {
                    urls,
                    polls_left: 0,
                    closable: true,
                });
            }
            LinkBehavior::NavigateInPlace { delay_polls } => {
                self.active_context_mut()?.pending = Some((target, delay_polls));
            }
            LinkBehavior::OpenAndLeak => {
                self.pending_opens.push(PendingOpen {
                    urls: vec![target],
                    polls_left: 0,
                    closable: false,
                });
            }
            LinkBehavior::NoOp => {}
        }
        Ok(())
    }

    async fn quit(&mut self) -> NavResult<()> {
        self.call_history.push("quit".to_string());
        self.contexts.clear();
        self.pending_opens.clear();
        self.active = None;
        Ok(())
    }
}
