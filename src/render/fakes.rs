//! In-memory browser backends for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{BrowserBackend, BrowserLauncher, PageBackend};
use super::types::{PdfRenderOptions, RenderError, Viewport};

/// Scripted page behaviour shared by every tab a fake browser opens
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    /// Applies to `goto` and `set_content`
    pub navigation_delay: Option<Duration>,
    pub navigation_error: Option<String>,
    /// `None` simulates a document without a body
    pub body_text: Option<String>,
}

pub struct FakeLauncher {
    browsers: Mutex<Vec<Arc<FakeBrowser>>>,
    launch_delay: Option<Duration>,
    close_delay: Option<Duration>,
    fail: bool,
    script: PageScript,
}

impl FakeLauncher {
    pub fn new() -> Arc<Self> {
        Self::build(None, false, PageScript::default())
    }

    pub fn with_launch_delay(delay: Duration) -> Arc<Self> {
        Self::build(Some(delay), false, PageScript::default())
    }

    /// Browsers whose `close` takes `delay` to return
    pub fn with_close_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            close_delay: Some(delay),
            ..Self::plain(None, false, PageScript::default())
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::build(None, true, PageScript::default())
    }

    pub fn with_script(script: PageScript) -> Arc<Self> {
        Self::build(None, false, script)
    }

    fn build(launch_delay: Option<Duration>, fail: bool, script: PageScript) -> Arc<Self> {
        Arc::new(Self::plain(launch_delay, fail, script))
    }

    fn plain(launch_delay: Option<Duration>, fail: bool, script: PageScript) -> Self {
        Self {
            browsers: Mutex::new(Vec::new()),
            launch_delay,
            close_delay: None,
            fail,
            script,
        }
    }

    pub fn launch_count(&self) -> usize {
        self.browsers.lock().unwrap().len()
    }

    pub fn browser(&self, index: usize) -> Arc<FakeBrowser> {
        Arc::clone(&self.browsers.lock().unwrap()[index])
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserBackend>, RenderError> {
        if let Some(delay) = self.launch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RenderError::ResourceUnavailable(
                "no chrome executable found".to_string(),
            ));
        }
        let browser = Arc::new(FakeBrowser {
            connected: AtomicBool::new(true),
            closes: AtomicUsize::new(0),
            close_delay: self.close_delay,
            pages: Mutex::new(Vec::new()),
            script: self.script.clone(),
        });
        self.browsers.lock().unwrap().push(Arc::clone(&browser));
        Ok(browser)
    }
}

pub struct FakeBrowser {
    connected: AtomicBool,
    closes: AtomicUsize,
    close_delay: Option<Duration>,
    pages: Mutex<Vec<Arc<FakePage>>>,
    script: PageScript,
}

impl FakeBrowser {
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn pages_opened(&self) -> usize {
        self.pages.lock().unwrap().len()
    }

    pub fn page(&self, index: usize) -> Arc<FakePage> {
        Arc::clone(&self.pages.lock().unwrap()[index])
    }
}

#[async_trait]
impl BrowserBackend for FakeBrowser {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn new_page(&self) -> Result<Box<dyn PageBackend>, RenderError> {
        let page = Arc::new(FakePage {
            script: self.script.clone(),
            viewport: Mutex::new(None),
            visited: Mutex::new(Vec::new()),
            html: Mutex::new(String::from("<html><head></head><body></body></html>")),
            last_pdf: Mutex::new(None),
            closed: AtomicBool::new(false),
        });
        self.pages.lock().unwrap().push(Arc::clone(&page));
        Ok(Box::new(FakeTab(page)))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePage {
    script: PageScript,
    viewport: Mutex<Option<Viewport>>,
    visited: Mutex<Vec<String>>,
    html: Mutex<String>,
    last_pdf: Mutex<Option<PdfRenderOptions>>,
    closed: AtomicBool,
}

impl FakePage {
    pub fn viewport(&self) -> Option<Viewport> {
        *self.viewport.lock().unwrap()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn html(&self) -> String {
        self.html.lock().unwrap().clone()
    }

    pub fn last_pdf_options(&self) -> Option<PdfRenderOptions> {
        *self.last_pdf.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeTab(Arc<FakePage>);

#[async_trait]
impl PageBackend for FakeTab {
    async fn set_viewport(&self, viewport: Viewport) -> Result<(), RenderError> {
        *self.0.viewport.lock().unwrap() = Some(viewport);
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), RenderError> {
        if let Some(delay) = self.0.script.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.0.script.navigation_error {
            return Err(RenderError::Navigation(message.clone()));
        }
        self.0.visited.lock().unwrap().push(url.to_string());
        *self.0.html.lock().unwrap() = format!("<html><body>{}</body></html>", url);
        Ok(())
    }

    async fn set_content(&self, html: &str) -> Result<(), RenderError> {
        if let Some(delay) = self.0.script.navigation_delay {
            tokio::time::sleep(delay).await;
        }
        *self.0.html.lock().unwrap() = html.to_string();
        Ok(())
    }

    async fn screenshot_png(&self, full_page: bool) -> Result<Vec<u8>, RenderError> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.push(u8::from(full_page));
        Ok(bytes)
    }

    async fn content(&self) -> Result<String, RenderError> {
        Ok(self.0.html())
    }

    async fn inner_text(&self) -> Result<String, RenderError> {
        Ok(self.0.script.body_text.clone().unwrap_or_default())
    }

    async fn print_pdf(&self, options: &PdfRenderOptions) -> Result<Vec<u8>, RenderError> {
        *self.0.last_pdf.lock().unwrap() = Some(*options);
        Ok(b"%PDF-1.7\n%%EOF".to_vec())
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.0.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
