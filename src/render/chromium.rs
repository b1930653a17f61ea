//! Headless Chromium backend
//!
//! Drives Chrome/Chromium over the DevTools protocol via `chromiumoxide`.
//! The CDP handler stream runs on its own task; when that task ends the
//! websocket is gone and the browser reports itself disconnected.
//!
//! Navigation waits for the main frame's `networkAlmostIdle` lifecycle event
//! (no more than two requests in flight for 500 ms). Inline HTML waits for
//! `document.readyState == "complete"`, which follows subresource loading.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, PrintToPdfParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::backend::{BrowserBackend, BrowserLauncher, PageBackend};
use super::types::{PdfRenderOptions, RenderError, Viewport};

/// Flags for running inside containers without user namespaces or /dev/shm
const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
    "--disable-web-security",
];

/// Upper bound on a single CDP request (screenshot, print, evaluate)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a graceful close or process exit may take before the process is killed
const CLOSE_GRACE: Duration = Duration::from_secs(5);

const READY_STATE_POLL: Duration = Duration::from_millis(50);

/// Lifecycle event that starts a new document in a frame
const LIFECYCLE_INIT: &str = "init";

/// Puppeteer's `networkidle2`
const LIFECYCLE_NETWORK_IDLE: &str = "networkAlmostIdle";

/// Launches headless Chromium processes
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable_path: Option<String>,
}

impl ChromiumLauncher {
    pub fn new(executable_path: Option<String>) -> Self {
        Self { executable_path }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserBackend>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .args(LAUNCH_ARGS.iter().copied())
            .request_timeout(REQUEST_TIMEOUT);

        if let Some(path) = &self.executable_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(RenderError::ResourceUnavailable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::ResourceUnavailable(e.to_string()))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser event loop error");
                }
            }
            tracing::debug!("Browser event loop ended");
        });

        tracing::info!(
            executable = self.executable_path.as_deref().unwrap_or("auto"),
            "Headless Chromium started"
        );

        Ok(Arc::new(ChromiumBrowser {
            browser: Mutex::new(browser),
            events,
        }))
    }
}

struct ChromiumBrowser {
    browser: Mutex<Browser>,
    events: JoinHandle<()>,
}

#[async_trait]
impl BrowserBackend for ChromiumBrowser {
    fn is_connected(&self) -> bool {
        !self.events.is_finished()
    }

    async fn new_page(&self) -> Result<Box<dyn PageBackend>, RenderError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::ResourceUnavailable(format!("Failed to open page: {}", e)))?;

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<(), RenderError> {
        let mut browser = self.browser.lock().await;

        let graceful = match timeout(CLOSE_GRACE, browser.close()).await {
            Ok(Ok(_)) => match timeout(CLOSE_GRACE, browser.wait()).await {
                Ok(_) => Ok(()),
                Err(_) => Err("process did not exit".to_string()),
            },
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("close request timed out".to_string()),
        };
        self.events.abort();

        let Err(reason) = graceful else {
            return Ok(());
        };
        tracing::warn!(reason = %reason, "Browser did not close gracefully, killing it");

        // Reaps the child as well
        match browser.kill().await {
            Some(Err(e)) => Err(RenderError::Render(format!(
                "Failed to kill browser after {}: {}",
                reason, e
            ))),
            _ => Ok(()),
        }
    }
}

struct ChromiumPage {
    page: Page,
}

/// One `Page.lifecycleEvent`, reduced to what the waits compare
#[derive(Debug, Clone, PartialEq)]
struct LifecycleMark {
    frame: String,
    loader: String,
    name: String,
}

impl ChromiumPage {
    /// Subscribe to lifecycle events; call before the action being awaited.
    async fn lifecycle(&self) -> Result<BoxStream<'static, LifecycleMark>, RenderError> {
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(render_err("Failed to enable lifecycle events"))?;
        let events = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(render_err("Failed to subscribe to lifecycle events"))?;

        Ok(events
            .map(|event| LifecycleMark {
                frame: event.frame_id.inner().clone(),
                loader: event.loader_id.inner().clone(),
                name: event.name.clone(),
            })
            .boxed())
    }

    async fn main_frame(&self) -> Result<String, RenderError> {
        let frame = self
            .page
            .mainframe()
            .await
            .map_err(render_err("Failed to read main frame"))?;
        Ok(match frame {
            Some(id) => id.inner().clone(),
            None => self.page.target_id().inner().clone(),
        })
    }

    async fn ready_state(&self) -> Result<String, RenderError> {
        self.page
            .evaluate("document.readyState")
            .await
            .map_err(render_err("Failed to read document state"))?
            .into_value::<String>()
            .map_err(|e| RenderError::Render(format!("Unexpected document state: {}", e)))
    }
}

/// Wait until `frame` reports the `target` lifecycle event for the newest
/// document started after subscribing. Returns false if the stream ends first.
async fn wait_for_lifecycle<S>(mut marks: S, frame: &str, target: &str) -> bool
where
    S: Stream<Item = LifecycleMark> + Unpin,
{
    let mut loader: Option<String> = None;

    while let Some(mark) = marks.next().await {
        if mark.frame != frame {
            continue;
        }
        if mark.name == LIFECYCLE_INIT {
            loader = Some(mark.loader);
        } else if mark.name == target && loader.as_ref() == Some(&mark.loader) {
            return true;
        }
    }

    false
}

fn render_err(context: &str) -> impl Fn(chromiumoxide::error::CdpError) -> RenderError + '_ {
    move |e| RenderError::Render(format!("{}: {}", context, e))
}

#[async_trait]
impl PageBackend for ChromiumPage {
    async fn set_viewport(&self, viewport: Viewport) -> Result<(), RenderError> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            1.0,
            false,
        );
        self.page
            .execute(params)
            .await
            .map_err(render_err("Failed to set viewport"))?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), RenderError> {
        let marks = self.lifecycle().await?;
        let frame = self.main_frame().await?;

        self.page
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        if wait_for_lifecycle(marks, &frame, LIFECYCLE_NETWORK_IDLE).await {
            Ok(())
        } else {
            Err(RenderError::Navigation(
                "Page closed before the network settled".to_string(),
            ))
        }
    }

    async fn set_content(&self, html: &str) -> Result<(), RenderError> {
        self.page
            .set_content(html)
            .await
            .map_err(render_err("Failed to load HTML"))?;

        while self.ready_state().await? != "complete" {
            tokio::time::sleep(READY_STATE_POLL).await;
        }
        Ok(())
    }

    async fn screenshot_png(&self, full_page: bool) -> Result<Vec<u8>, RenderError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(render_err("Failed to capture screenshot"))
    }

    async fn content(&self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(render_err("Failed to read page content"))
    }

    async fn inner_text(&self) -> Result<String, RenderError> {
        let result = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(render_err("Failed to read page text"))?;
        result
            .into_value::<String>()
            .map_err(|e| RenderError::Render(format!("Unexpected page text value: {}", e)))
    }

    async fn print_pdf(&self, options: &PdfRenderOptions) -> Result<Vec<u8>, RenderError> {
        let (paper_width, paper_height) = options.format.size_inches();
        let params = PrintToPdfParams {
            landscape: Some(options.landscape),
            print_background: Some(options.print_background),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            ..Default::default()
        };
        self.page
            .pdf(params)
            .await
            .map_err(render_err("Failed to print PDF"))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(render_err("Failed to close page"))
    }
}
