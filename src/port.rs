//! The navigation port: the capability surface the crawl depends on for
//! moving around pages and reading fragments.
//!
//! The orchestrator and run driver only ever talk to the browser through
//! [`NavigationPort`]. The production implementation lives in
//! [`crate::browser`]; tests inject a deterministic scripted one, which is
//! what keeps the orchestration state machine and the recovery policy
//! testable without a browser.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Navigation-level failures.
///
/// Timeouts and intercepted clicks are expected, non-fatal events handled by
/// the enclosing step; session loss is surfaced to the run driver, which
/// releases and re-acquires the session.
#[derive(Debug, Error)]
pub enum NavError {
    /// An expected element did not render within the deadline.
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },

    /// A click was blocked by an overlay and the scripted fallback click
    /// also failed. Interceptions recovered by the fallback are never
    /// surfaced.
    #[error("click intercepted and scripted fallback failed: {0}")]
    ClickIntercepted(String),

    /// An element expected at a fixed position was not present.
    #[error("element {index} not found under `{selector}` ({found} present)")]
    MissingElement {
        selector: String,
        index: usize,
        found: usize,
    },

    /// The browser session is gone.
    #[error("browser session lost: {0}")]
    Session(String),

    /// Any other failure from the underlying automation driver.
    #[error("navigation driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl NavError {
    /// Wrap an arbitrary driver error.
    pub fn driver(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        NavError::Driver(Box::new(e))
    }
}

/// Capability contract for driving one browser page.
///
/// Exactly one page is active at a time; all operations act on it. Element
/// handles are opaque to the core and may go stale after navigation — a
/// stale handle fails on use and is dealt with by the caller's recovery
/// policy, not by the port.
#[async_trait]
pub trait NavigationPort: Send {
    /// Opaque reference to a rendered element.
    type Handle: Send + Sync;

    /// Load a page, replacing whatever is currently displayed.
    async fn open(&mut self, url: &str) -> Result<(), NavError>;

    /// Poll until `selector` matches an element or the deadline passes.
    async fn wait_for(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, NavError>;

    /// All elements matching `selector`, in DOM discovery order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<Self::Handle>, NavError>;

    /// The rendered text of an element.
    async fn text(&mut self, handle: &Self::Handle) -> Result<String, NavError>;

    /// The inner markup of an element (tags included).
    async fn inner_markup(&mut self, handle: &Self::Handle) -> Result<String, NavError>;

    /// Click an element. Implementations attempt a native interaction click
    /// and fall back to a programmatic click on interception; a short settle
    /// delay follows either way.
    async fn click(&mut self, handle: &Self::Handle) -> Result<(), NavError>;

    /// Browser-history back navigation.
    async fn back(&mut self) -> Result<(), NavError>;

    /// The URL of the active page. Doubles as the session liveness probe:
    /// if this fails, the driver treats the session as lost.
    async fn current_url(&mut self) -> Result<String, NavError>;

    /// Release the session. Safe to call more than once.
    async fn close(&mut self) -> Result<(), NavError>;
}
