//! Browser Backends
//!
//! Trait seams between the browser manager and the process that actually
//! renders pages. The production implementation drives headless Chromium
//! (see `chromium.rs`); tests plug in in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{PdfRenderOptions, RenderError, Viewport};

/// Starts browser processes
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a new browser process
    async fn launch(&self) -> Result<Arc<dyn BrowserBackend>, RenderError>;
}

/// A running browser process
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// Whether the connection to the process is still alive
    fn is_connected(&self) -> bool;

    /// Open a new blank tab
    async fn new_page(&self) -> Result<Box<dyn PageBackend>, RenderError>;

    /// Terminate the process
    async fn close(&self) -> Result<(), RenderError>;
}

/// One browser tab
#[async_trait]
pub trait PageBackend: Send + Sync {
    async fn set_viewport(&self, viewport: Viewport) -> Result<(), RenderError>;

    /// Navigate and wait for the page to settle
    async fn goto(&self, url: &str) -> Result<(), RenderError>;

    /// Replace the document with the given markup
    async fn set_content(&self, html: &str) -> Result<(), RenderError>;

    /// Capture a PNG of the viewport or of the whole scrollable page
    async fn screenshot_png(&self, full_page: bool) -> Result<Vec<u8>, RenderError>;

    /// Serialized DOM
    async fn content(&self) -> Result<String, RenderError>;

    /// `document.body.innerText`, empty when the document has no body
    async fn inner_text(&self) -> Result<String, RenderError>;

    async fn print_pdf(&self, options: &PdfRenderOptions) -> Result<Vec<u8>, RenderError>;

    async fn close(&self) -> Result<(), RenderError>;
}
