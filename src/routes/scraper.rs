//! Web page capture endpoints
//!
//! - Screenshot a URL as PNG
//! - Extract rendered HTML or visible text from a URL

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::render::{self, ContentFormat, Viewport};
use crate::routes::{attachment, form::Form};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
    pub format: ContentFormat,
    pub url: String,
}

/// Create the scraper router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/screenshot", post(take_screenshot))
        .route("/content", post(extract_content))
}

fn require_url(form: &Form) -> Result<String> {
    form.text("url")
        .ok_or_else(|| AppError::BadRequest("URL is required".to_string()))
}

/// Capture a PNG screenshot of a page
async fn take_screenshot(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let form = Form::read(multipart).await?;
    let url = require_url(&form)?;
    let full_page = form.flag("fullPage");
    let viewport = Viewport::from_optional(form.parse("width")?, form.parse("height")?);

    tracing::info!(url = %url, full_page, ?viewport, "Taking screenshot");

    let png = render::screenshot(state.browser(), &url, full_page, viewport).await?;

    attachment("image/png", "screenshot.png", png)
}

/// Return the rendered HTML or visible text of a page
async fn extract_content(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ContentResponse>> {
    let form = Form::read(multipart).await?;
    let url = require_url(&form)?;
    let format = match form.text("format") {
        None => ContentFormat::default(),
        Some(raw) => ContentFormat::parse(&raw).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid format '{}': expected html or text", raw))
        })?,
    };

    tracing::info!(url = %url, format = format.as_str(), "Extracting content");

    let content = render::extract_content(state.browser(), &url, format).await?;

    Ok(Json(ContentResponse {
        content,
        format,
        url,
    }))
}
