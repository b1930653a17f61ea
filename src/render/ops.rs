//! Render operations
//!
//! Screenshot, content extraction and PDF printing. Each operation borrows one
//! page session from the [`BrowserManager`] and closes it before returning,
//! whether the operation succeeded or not.

use std::future::Future;

use tokio::time::timeout;

use super::manager::BrowserManager;
use super::session::PageSession;
use super::types::{ContentFormat, PdfRenderOptions, RenderError, RenderSource, Viewport};

/// Capture a PNG screenshot of a URL.
///
/// The viewport is applied before navigation so responsive layouts render at
/// the requested size.
pub async fn screenshot(
    manager: &BrowserManager,
    url: &str,
    full_page: bool,
    viewport: Option<Viewport>,
) -> Result<Vec<u8>, RenderError> {
    let session = manager.acquire_page(viewport).await?;

    let result = async {
        navigate(manager, &session, url).await?;
        session.screenshot_png(full_page).await
    }
    .await;

    session.close().await;

    if let Ok(bytes) = &result {
        tracing::debug!(url, full_page, bytes = bytes.len(), "Screenshot captured");
    }
    result
}

/// Extract rendered HTML or visible text from a URL.
pub async fn extract_content(
    manager: &BrowserManager,
    url: &str,
    format: ContentFormat,
) -> Result<String, RenderError> {
    let session = manager.acquire_page(None).await?;

    let result = async {
        navigate(manager, &session, url).await?;
        match format {
            ContentFormat::Text => session.inner_text().await,
            ContentFormat::Html => session.content().await,
        }
    }
    .await;

    session.close().await;
    result
}

/// Print HTML markup or a remote page to PDF.
pub async fn render_pdf(
    manager: &BrowserManager,
    source: &RenderSource,
    options: &PdfRenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let session = manager.acquire_page(None).await?;

    let result = async {
        match source {
            RenderSource::Html(html) => {
                within_navigation_timeout(manager, "inline HTML", session.set_content(html)).await?
            }
            RenderSource::Url(url) => navigate(manager, &session, url).await?,
        }
        session.print_pdf(options).await
    }
    .await;

    session.close().await;

    if let Ok(bytes) = &result {
        tracing::debug!(
            format = ?options.format,
            landscape = options.landscape,
            bytes = bytes.len(),
            "PDF rendered"
        );
    }
    result
}

/// Navigate within the manager's navigation timeout.
async fn navigate(
    manager: &BrowserManager,
    session: &PageSession,
    url: &str,
) -> Result<(), RenderError> {
    within_navigation_timeout(manager, url, session.goto(url)).await
}

async fn within_navigation_timeout<F>(
    manager: &BrowserManager,
    what: &str,
    load: F,
) -> Result<(), RenderError>
where
    F: Future<Output = Result<(), RenderError>>,
{
    let limit = manager.navigation_timeout();
    match timeout(limit, load).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(page = what, timeout_ms = limit.as_millis() as u64, "Page load timed out");
            Err(RenderError::NavigationTimeout(limit.as_millis()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::fakes::{FakeLauncher, PageScript};
    use crate::render::types::PaperFormat;

    #[tokio::test]
    async fn test_screenshot_sets_viewport_and_closes_page() {
        let launcher = FakeLauncher::new();
        let manager = BrowserManager::new(launcher.clone());

        let viewport = Viewport::from_optional(Some(1280), None);
        let png = screenshot(&manager, "https://example.com", true, viewport)
            .await
            .unwrap();

        assert!(png.starts_with(b"\x89PNG"));
        assert_eq!(*png.last().unwrap(), 1);

        let page = launcher.browser(0).page(0);
        assert_eq!(page.viewport(), Some(Viewport { width: 1280, height: 1080 }));
        assert_eq!(page.visited(), vec!["https://example.com".to_string()]);
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_screenshot_without_dimensions_keeps_default_viewport() {
        let launcher = FakeLauncher::new();
        let manager = BrowserManager::new(launcher.clone());

        screenshot(&manager, "https://example.com", false, None)
            .await
            .unwrap();

        assert_eq!(launcher.browser(0).page(0).viewport(), None);
    }

    #[tokio::test]
    async fn test_navigation_timeout_closes_page_and_keeps_browser() {
        let launcher = FakeLauncher::with_script(PageScript {
            navigation_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let manager =
            BrowserManager::new(launcher.clone()).with_navigation_timeout(Duration::from_millis(20));

        let err = screenshot(&manager, "https://slow.example", false, None)
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::NavigationTimeout(20)));
        assert!(launcher.browser(0).page(0).is_closed());
        assert!(manager.is_running().await);
        assert_eq!(launcher.browser(0).close_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_screenshot_still_closes_page() {
        let launcher = FakeLauncher::with_script(PageScript {
            navigation_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let manager = BrowserManager::new(launcher.clone());

        // The request is dropped mid-navigation, as on client disconnect
        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            screenshot(&manager, "https://slow.example", false, None),
        )
        .await;
        assert!(cancelled.is_err());

        let page = launcher.browser(0).page(0);
        for _ in 0..10 {
            if page.is_closed() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(page.is_closed());
        assert!(manager.is_running().await);
    }

    #[tokio::test]
    async fn test_slow_inline_html_times_out_and_closes_page() {
        let launcher = FakeLauncher::with_script(PageScript {
            navigation_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let manager =
            BrowserManager::new(launcher.clone()).with_navigation_timeout(Duration::from_millis(20));

        let err = render_pdf(
            &manager,
            &RenderSource::Html("<img src=\"https://slow.example/a.png\">".into()),
            &PdfRenderOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RenderError::NavigationTimeout(20)));
        let page = launcher.browser(0).page(0);
        assert!(page.is_closed());
        assert_eq!(page.last_pdf_options(), None);
    }

    #[tokio::test]
    async fn test_navigation_error_surfaces_message() {
        let launcher = FakeLauncher::with_script(PageScript {
            navigation_error: Some("net::ERR_NAME_NOT_RESOLVED".to_string()),
            ..Default::default()
        });
        let manager = BrowserManager::new(launcher.clone());

        let err = extract_content(&manager, "https://nope.invalid", ContentFormat::Html)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
        assert!(launcher.browser(0).page(0).is_closed());
    }

    #[tokio::test]
    async fn test_extract_text_without_body_is_empty() {
        let launcher = FakeLauncher::new();
        let manager = BrowserManager::new(launcher);

        let text = extract_content(&manager, "https://example.com", ContentFormat::Text)
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_extract_text_and_html() {
        let launcher = FakeLauncher::with_script(PageScript {
            body_text: Some("Hello world".to_string()),
            ..Default::default()
        });
        let manager = BrowserManager::new(launcher);

        let text = extract_content(&manager, "https://example.com", ContentFormat::Text)
            .await
            .unwrap();
        assert_eq!(text, "Hello world");

        let html = extract_content(&manager, "https://example.com", ContentFormat::Html)
            .await
            .unwrap();
        assert!(html.contains("<body>"));
    }

    #[tokio::test]
    async fn test_render_pdf_from_html_skips_navigation() {
        let launcher = FakeLauncher::new();
        let manager = BrowserManager::new(launcher.clone());

        let options = PdfRenderOptions {
            format: PaperFormat::Legal,
            landscape: true,
            print_background: false,
        };
        let pdf = render_pdf(&manager, &RenderSource::Html("<h1>Invoice</h1>".into()), &options)
            .await
            .unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        let page = launcher.browser(0).page(0);
        assert!(page.visited().is_empty());
        assert_eq!(page.html(), "<h1>Invoice</h1>");
        assert_eq!(page.last_pdf_options(), Some(options));
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_render_pdf_from_url_navigates() {
        let launcher = FakeLauncher::new();
        let manager = BrowserManager::new(launcher.clone());

        render_pdf(
            &manager,
            &RenderSource::Url("https://example.com/report".into()),
            &PdfRenderOptions::default(),
        )
        .await
        .unwrap();

        let page = launcher.browser(0).page(0);
        assert_eq!(page.visited(), vec!["https://example.com/report".to_string()]);
    }
}
