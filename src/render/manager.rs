//! Browser manager for the shared headless browser.
//!
//! One browser process is shared by every render request. It is launched on
//! first use, replaced if it dies, and torn down on shutdown. Each request
//! gets its own tab. Teardown is bounded by a timeout; a dead browser being
//! replaced is torn down in the background so new requests never wait on it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::backend::{BrowserBackend, BrowserLauncher};
use super::session::PageSession;
use super::types::{RenderError, Viewport, NAVIGATION_TIMEOUT};

/// Upper bound on tearing down one browser process
pub const BROWSER_CLOSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Owns the single shared browser process
pub struct BrowserManager {
    launcher: Arc<dyn BrowserLauncher>,
    /// Held across launch so concurrent first requests share one process
    browser: Mutex<Option<Arc<dyn BrowserBackend>>>,
    navigation_timeout: Duration,
    close_timeout: Duration,
}

impl BrowserManager {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            browser: Mutex::new(None),
            navigation_timeout: NAVIGATION_TIMEOUT,
            close_timeout: BROWSER_CLOSE_TIMEOUT,
        }
    }

    /// Override the navigation timeout (tests use short timeouts)
    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    /// Return the live browser, launching one if needed.
    pub async fn acquire_browser(&self) -> Result<Arc<dyn BrowserBackend>, RenderError> {
        let mut slot = self.browser.lock().await;

        if let Some(browser) = slot.as_ref() {
            if browser.is_connected() {
                return Ok(Arc::clone(browser));
            }
        }

        if let Some(stale) = slot.take() {
            tracing::warn!("Browser disconnected, launching a replacement");
            tokio::spawn(teardown(stale, self.close_timeout));
        }

        tracing::info!("Launching headless browser");
        let browser = self.launcher.launch().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to launch browser");
            e
        })?;
        *slot = Some(Arc::clone(&browser));

        Ok(browser)
    }

    /// Open a new tab on the shared browser, applying the viewport first.
    pub async fn acquire_page(&self, viewport: Option<Viewport>) -> Result<PageSession, RenderError> {
        let browser = self.acquire_browser().await?;
        let session = PageSession::new(browser.new_page().await?);

        if let Some(viewport) = viewport {
            if let Err(e) = session.set_viewport(viewport).await {
                session.close().await;
                return Err(e);
            }
        }

        Ok(session)
    }

    /// Close the browser if one is running. Safe to call any number of times.
    pub async fn release_all(&self) {
        let browser = self.browser.lock().await.take();

        if let Some(browser) = browser {
            tracing::info!("Closing headless browser");
            teardown(browser, self.close_timeout).await;
        }
    }

    /// Whether a browser process is currently held
    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}

async fn teardown(browser: Arc<dyn BrowserBackend>, limit: Duration) {
    match tokio::time::timeout(limit, browser.close()).await {
        Ok(Ok(())) => tracing::debug!("Browser closed"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Failed to close browser cleanly"),
        Err(_) => tracing::warn!(
            timeout_ms = limit.as_millis() as u64,
            "Browser did not close in time, abandoning it"
        ),
    }
}
