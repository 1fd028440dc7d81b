//! Chromium-backed implementation of the navigation port.
//!
//! Owns one browser process and one page for its whole lifetime. Launch
//! applies the anti-automation options the target site is known to check
//! (no automation blink feature, a plain desktop user agent, a fixed window
//! size) and the `navigator.webdriver` override is installed before any
//! document loads.
//!
//! Waits come in two flavors, both suspension points of the crawl:
//! - [`NavigationPort::wait_for`] polls for a selector under a deadline;
//! - a fixed settle delay follows clicks and navigations, because the site
//!   re-renders asynchronously with no DOM signal to wait on.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::port::{NavError, NavigationPort};

/// Plain desktop user agent presented to the site.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Script installed before any document loads.
const WEBDRIVER_OVERRIDE: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined })";

/// Interval between selector polls inside `wait_for`.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Session launch parameters.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Fixed pause after clicks and navigations.
    pub settle: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            settle: Duration::from_millis(1500),
        }
    }
}

/// One Chromium process with one active page.
pub struct ChromiumPort {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    settle: Duration,
    closed: bool,
}

impl ChromiumPort {
    /// Launch a browser and open the blank working page.
    #[instrument(level = "info", skip_all, fields(headless = opts.headless))]
    pub async fn launch(opts: &LaunchOptions) -> Result<Self, NavError> {
        let mut config = BrowserConfig::builder().window_size(1920, 1080).args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-blink-features=AutomationControlled",
        ]);
        if !opts.headless {
            config = config.with_head();
        }
        let config = config.build().map_err(NavError::Session)?;

        let (browser, mut events) = Browser::launch(config).await.map_err(NavError::driver)?;
        // The event handler must be drained for the session to make progress.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(NavError::driver)?;
        page.set_user_agent(USER_AGENT).await.map_err(NavError::driver)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(WEBDRIVER_OVERRIDE))
            .await
            .map_err(NavError::driver)?;

        info!("Browser session started");
        Ok(Self {
            browser,
            page,
            handler,
            settle: opts.settle,
            closed: false,
        })
    }
}

#[async_trait]
impl NavigationPort for ChromiumPort {
    type Handle = Element;

    async fn open(&mut self, url: &str) -> Result<(), NavError> {
        debug!(%url, "Opening page");
        self.page.goto(url).await.map_err(NavError::driver)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(NavError::driver)?;
        sleep(self.settle).await;
        Ok(())
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, NavError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(NavError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Self::Handle>, NavError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(NavError::driver)
    }

    async fn text(&mut self, handle: &Self::Handle) -> Result<String, NavError> {
        handle
            .inner_text()
            .await
            .map(|text| text.unwrap_or_default())
            .map_err(NavError::driver)
    }

    async fn inner_markup(&mut self, handle: &Self::Handle) -> Result<String, NavError> {
        let returned = handle
            .call_js_fn("function() { return this.innerHTML; }", false)
            .await
            .map_err(NavError::driver)?;
        Ok(returned
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn click(&mut self, handle: &Self::Handle) -> Result<(), NavError> {
        // Best effort; a failed scroll just makes the native click likelier
        // to be intercepted.
        let _ = handle.scroll_into_view().await;

        if let Err(native) = handle.click().await {
            debug!(error = %native, "Native click failed; trying scripted click");
            handle
                .call_js_fn("function() { this.click(); }", false)
                .await
                .map_err(|scripted| {
                    NavError::ClickIntercepted(format!(
                        "native: {native}; scripted: {scripted}"
                    ))
                })?;
        }
        sleep(self.settle).await;
        Ok(())
    }

    async fn back(&mut self) -> Result<(), NavError> {
        self.page
            .evaluate("window.history.back()")
            .await
            .map_err(NavError::driver)?;
        sleep(self.settle).await;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, NavError> {
        self.page
            .url()
            .await
            .map(|url| url.unwrap_or_default())
            .map_err(|e| NavError::Session(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), NavError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed; killing the process");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        info!("Browser session closed");
        Ok(())
    }
}
