//! Chromium session over the Chrome `DevTools` Protocol.
//!
//! Each page target is one browsing context; its CDP target id is the
//! [`ContextHandle`]. Tabs opened by the page itself (`target="_blank"`,
//! `window.open`) are picked up by re-reading the target list every time
//! the handle set is requested.

use crate::driver::{BrowsingSession, ContextHandle, ElementRef, HandleSet, SessionConfig};
use crate::result::{NavError, NavResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

const INTERACTABLE_JS: &str = "function() { \
    if (!this.isConnected) { return false; } \
    const rect = this.getBoundingClientRect(); \
    const style = window.getComputedStyle(this); \
    return rect.width > 0 && rect.height > 0 \
        && style.visibility !== 'hidden' && style.display !== 'none' \
        && !this.disabled && this.getAttribute('aria-disabled') !== 'true'; \
}";

const TAG_NAME_JS: &str = "function() { return this.tagName.toLowerCase(); }";

/// Extra command-line switches derived from the session config
fn launch_args(config: &SessionConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(ua) = &config.user_agent {
        args.push(format!("--user-agent={ua}"));
    }
    args
}

/// Drop targets this session already closed from a fresh target listing.
///
/// `Page.close` is answered before the browser reports the target destroyed,
/// so a listing taken right after a close can still contain it. Closed ids
/// that no longer appear are forgotten.
fn live_pages<P>(
    listed: BTreeMap<ContextHandle, P>,
    closed: &mut BTreeSet<ContextHandle>,
) -> BTreeMap<ContextHandle, P> {
    closed.retain(|handle| listed.contains_key(handle));
    listed
        .into_iter()
        .filter(|(handle, _)| !closed.contains(handle))
        .collect()
}

/// Live Chromium instance driven over CDP
#[derive(Debug)]
pub struct ChromiumSession {
    config: SessionConfig,
    browser: CdpBrowser,
    pages: BTreeMap<ContextHandle, CdpPage>,
    closed: BTreeSet<ContextHandle>,
    active: Option<ContextHandle>,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium and open one blank context
    pub async fn launch(config: SessionConfig) -> NavResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout)
            .args(launch_args(&config));

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|message| {
            if config.chromium_path.is_none() && message.contains("detect") {
                NavError::BrowserNotFound
            } else {
                NavError::BrowserLaunchError { message }
            }
        })?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
            NavError::BrowserLaunchError {
                message: e.to_string(),
            }
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        let handle = ContextHandle::new(page.target_id().inner().clone());
        debug!(%handle, "browser launched");

        let mut pages = BTreeMap::new();
        let _ = pages.insert(handle.clone(), page);

        Ok(Self {
            config,
            browser,
            pages,
            closed: BTreeSet::new(),
            active: Some(handle),
            handler,
        })
    }

    /// Configuration the browser was launched with
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn active_page(&self) -> NavResult<&CdpPage> {
        let handle = self
            .active
            .as_ref()
            .ok_or_else(|| NavError::session("no active context"))?;
        self.pages
            .get(handle)
            .ok_or_else(|| NavError::session(format!("context {handle} is closed")))
    }

    async fn find_cdp_element(&self, selector: &str) -> NavResult<chromiumoxide::Element> {
        self.active_page()?
            .find_element(selector)
            .await
            .map_err(|_| NavError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// Re-read page targets so tabs opened by the page become visible
    async fn refresh_pages(&mut self) -> NavResult<()> {
        let _ = self
            .browser
            .fetch_targets()
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| NavError::session(e.to_string()))?;

        let listed = pages
            .into_iter()
            .map(|page| (ContextHandle::new(page.target_id().inner().clone()), page))
            .collect();
        self.pages = live_pages(listed, &mut self.closed);
        Ok(())
    }
}

#[async_trait]
impl BrowsingSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> NavResult<()> {
        let page = self.active_page()?;
        let _ = page.goto(url).await.map_err(|e| NavError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn go_back(&mut self) -> NavResult<()> {
        let _ = self
            .active_page()?
            .evaluate("window.history.back()")
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&mut self) -> NavResult<String> {
        let url = self
            .active_page()?
            .url()
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn window_handles(&mut self) -> NavResult<HandleSet> {
        self.refresh_pages().await?;
        Ok(self.pages.keys().cloned().collect())
    }

    async fn active_handle(&mut self) -> NavResult<ContextHandle> {
        self.active
            .clone()
            .ok_or_else(|| NavError::session("no active context"))
    }

    async fn switch_to(&mut self, handle: &ContextHandle) -> NavResult<()> {
        if !self.pages.contains_key(handle) {
            self.refresh_pages().await?;
        }
        let page = self
            .pages
            .get(handle)
            .ok_or_else(|| NavError::session(format!("no such context {handle}")))?;
        let _ = page
            .bring_to_front()
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        self.active = Some(handle.clone());
        Ok(())
    }

    async fn close_active(&mut self) -> NavResult<()> {
        let handle = self
            .active
            .take()
            .ok_or_else(|| NavError::session("no active context"))?;
        let page = self
            .pages
            .remove(&handle)
            .ok_or_else(|| NavError::session(format!("context {handle} is closed")))?;
        page.close()
            .await
            .map_err(|e| NavError::session(format!("closing {handle}: {e}")))?;
        debug!(%handle, "context closed");
        let _ = self.closed.insert(handle);
        Ok(())
    }

    async fn find_element(&mut self, selector: &str) -> NavResult<ElementRef> {
        let element = self.find_cdp_element(selector).await?;
        let tag = element
            .call_js_fn(TAG_NAME_JS, false)
            .await
            .ok()
            .and_then(|r| r.result.value)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let href = element
            .attribute("href")
            .await
            .map_err(|e| NavError::session(e.to_string()))?;

        let mut found = ElementRef::new(selector, tag);
        if let Some(href) = href {
            found = found.with_href(href);
        }
        Ok(found)
    }

    async fn is_interactable(&mut self, element: &ElementRef) -> NavResult<bool> {
        let Ok(found) = self.find_cdp_element(&element.selector).await else {
            // detached since it was located
            return Ok(false);
        };
        let returns = found
            .call_js_fn(INTERACTABLE_JS, false)
            .await
            .map_err(|e| NavError::session(e.to_string()))?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn click(&mut self, element: &ElementRef) -> NavResult<()> {
        let found = self.find_cdp_element(&element.selector).await?;
        let _ = found
            .click()
            .await
            .map_err(|e| NavError::ElementNotInteractable {
                selector: element.selector.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn quit(&mut self) -> NavResult<()> {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        self.pages.clear();
        self.closed.clear();
        self.active = None;
        Ok(())
    }
}
