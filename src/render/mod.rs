//! Render Module
//!
//! Headless browser rendering: screenshots, content extraction and
//! HTML/URL-to-PDF printing on top of one shared browser process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docforge_server::render::{BrowserManager, ChromiumLauncher, ContentFormat};
//!
//! let manager = BrowserManager::new(Arc::new(ChromiumLauncher::new(None)));
//!
//! let text = render::extract_content(&manager, "https://example.com", ContentFormat::Text).await?;
//!
//! // On shutdown
//! manager.release_all().await;
//! ```

mod backend;
mod chromium;
mod manager;
mod ops;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod fakes;

pub use backend::{BrowserBackend, BrowserLauncher, PageBackend};
pub use chromium::ChromiumLauncher;
pub use manager::{BrowserManager, BROWSER_CLOSE_TIMEOUT};
pub use ops::{extract_content, render_pdf, screenshot};
pub use session::PageSession;
pub use types::{
    ContentFormat, PaperFormat, PdfRenderOptions, RenderError, RenderSource, Viewport,
    DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, NAVIGATION_TIMEOUT,
};
