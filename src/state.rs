//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::render::{BrowserLauncher, BrowserManager, ChromiumLauncher};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    browser: BrowserManager,
}

impl AppState {
    /// Create state backed by a headless Chromium.
    ///
    /// The browser itself is only launched on the first render request.
    pub fn new(config: Config) -> Self {
        let launcher = Arc::new(ChromiumLauncher::new(config.browser.executable_path.clone()));
        Self::with_launcher(config, launcher)
    }

    /// Create state with an explicit browser launcher
    pub fn with_launcher(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self::with_browser(config, BrowserManager::new(launcher))
    }

    /// Create state around a preconfigured browser manager
    pub fn with_browser(config: Config, browser: BrowserManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, browser }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the shared browser manager
    pub fn browser(&self) -> &BrowserManager {
        &self.inner.browser
    }

    /// Release the shared browser.
    ///
    /// Call once before the process exits; later calls are no-ops.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.browser.release_all().await;
    }
}
