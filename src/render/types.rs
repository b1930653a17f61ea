//! Render Types
//!
//! Options and error types shared by the browser manager, the render
//! operations and the concrete browser backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default timeout for page navigation.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Viewport width used when only a height is requested.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;

/// Viewport height used when only a width is requested.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;

/// Browser viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    /// Build a viewport from optional dimensions.
    ///
    /// Returns `None` when neither dimension is given, so the browser keeps
    /// its own default viewport.
    pub fn from_optional(width: Option<u32>, height: Option<u32>) -> Option<Self> {
        if width.is_none() && height.is_none() {
            return None;
        }
        Some(Self {
            width: width.unwrap_or(DEFAULT_VIEWPORT_WIDTH),
            height: height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        })
    }
}

/// What to extract from a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Serialized DOM after scripts ran
    #[default]
    Html,
    /// Visible text of the document body
    Text,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "html" => Some(Self::Html),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Paper sizes accepted by the PDF printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperFormat {
    #[default]
    A4,
    Letter,
    A3,
    A5,
    Tabloid,
    Legal,
}

impl PaperFormat {
    /// Paper size as (width, height) in inches, portrait orientation
    pub fn size_inches(&self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.7),
            Self::Letter => (8.5, 11.0),
            Self::A3 => (11.7, 16.54),
            Self::A5 => (5.83, 8.27),
            Self::Tabloid => (11.0, 17.0),
            Self::Legal => (8.5, 14.0),
        }
    }
}

/// Where the PDF content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSource {
    /// Raw HTML markup loaded into a blank page
    Html(String),
    /// Remote page to navigate to
    Url(String),
}

impl RenderSource {
    /// Build a source from the two optional request fields.
    ///
    /// Exactly one of them must be present and non-empty.
    pub fn from_fields(html: Option<String>, url: Option<String>) -> Result<Self, RenderError> {
        let html = html.filter(|h| !h.trim().is_empty());
        let url = url.filter(|u| !u.trim().is_empty());
        match (html, url) {
            (Some(html), None) => Ok(Self::Html(html)),
            (None, Some(url)) => Ok(Self::Url(url)),
            (Some(_), Some(_)) => Err(RenderError::InvalidInput(
                "Provide either html or url, not both".to_string(),
            )),
            (None, None) => Err(RenderError::InvalidInput(
                "Either html or url must be provided".to_string(),
            )),
        }
    }
}

/// Options for printing a page to PDF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRenderOptions {
    pub format: PaperFormat,
    pub landscape: bool,
    pub print_background: bool,
}

impl Default for PdfRenderOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            landscape: false,
            print_background: true,
        }
    }
}

/// Render error types
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Browser unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Navigation timed out after {0} ms")]
    NavigationTimeout(u128),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Render failed: {0}")]
    Render(String),
}

impl RenderError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::ResourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NavigationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Navigation(_) | Self::Render(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_defaults_missing_dimension() {
        assert_eq!(Viewport::from_optional(None, None), None);
        assert_eq!(
            Viewport::from_optional(Some(800), None),
            Some(Viewport { width: 800, height: 1080 })
        );
        assert_eq!(
            Viewport::from_optional(None, Some(600)),
            Some(Viewport { width: 1920, height: 600 })
        );
    }

    #[test]
    fn test_render_source_exactly_one() {
        assert_eq!(
            RenderSource::from_fields(Some("<p>hi</p>".into()), None).unwrap(),
            RenderSource::Html("<p>hi</p>".into())
        );
        assert_eq!(
            RenderSource::from_fields(None, Some("https://example.com".into())).unwrap(),
            RenderSource::Url("https://example.com".into())
        );
        assert!(RenderSource::from_fields(None, None).is_err());
        assert!(RenderSource::from_fields(Some("  ".into()), None).is_err());
        assert!(RenderSource::from_fields(Some("x".into()), Some("https://a.b".into())).is_err());
    }

    #[test]
    fn test_paper_sizes_are_portrait() {
        for format in [PaperFormat::A4, PaperFormat::Letter, PaperFormat::Tabloid] {
            let (w, h) = format.size_inches();
            assert!(w < h);
        }
    }

    #[test]
    fn test_content_format_parse() {
        assert_eq!(ContentFormat::parse("TEXT"), Some(ContentFormat::Text));
        assert_eq!(ContentFormat::parse("html"), Some(ContentFormat::Html));
        assert_eq!(ContentFormat::parse("markdown"), None);
    }
}
