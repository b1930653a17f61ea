//! PDF API endpoints
//!
//! - Split a PDF into single pages (ZIP)
//! - Merge several PDFs into one
//! - Extract page groups into separate PDFs (ZIP)
//! - Print HTML or a URL to PDF

use axum::{
    extract::{Multipart, State},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::archive;
use crate::error::{AppError, Result};
use crate::pdf;
use crate::render::{self, PaperFormat, PdfRenderOptions, RenderSource};
use crate::routes::{attachment, blocking, form::require_pdf, form::Form};
use crate::state::AppState;

/// Request body for HTML/URL to PDF conversion
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromHtmlRequest {
    pub html: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub format: PaperFormat,
    #[serde(default)]
    pub landscape: bool,
    #[serde(default = "default_print_background")]
    pub print_background: bool,
}

fn default_print_background() -> bool {
    true
}

/// Create the PDF router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/split", post(split_pdf))
        .route("/merge", post(merge_pdfs))
        .route("/extract", post(extract_pages))
        .route("/from-html", post(from_html))
}

/// Split every page into its own PDF, returned as `pages.zip`
async fn split_pdf(multipart: Multipart) -> Result<Response> {
    let form = Form::read(multipart).await?;
    let data = form.pdf("file")?.data.clone();

    let (pages, zip) = blocking(move || {
        let pages = pdf::split_pdf(&data)?;
        Ok((pages.len(), archive::create_archive(&pages, None)?))
    })
    .await?;
    tracing::info!(pages, bytes = zip.len(), "Split PDF");

    attachment("application/zip", "pages.zip", zip)
}

/// Concatenate all uploaded `files` into `merged.pdf`
async fn merge_pdfs(multipart: Multipart) -> Result<Response> {
    let form = Form::read(multipart).await?;
    let uploads: Vec<_> = form.fields("files").filter(|f| !f.data.is_empty()).collect();

    if uploads.is_empty() {
        return Err(AppError::BadRequest(
            "At least one PDF file is required".to_string(),
        ));
    }
    for upload in &uploads {
        require_pdf(upload)?;
    }

    let documents: Vec<Vec<u8>> = uploads.iter().map(|f| f.data.to_vec()).collect();
    let count = documents.len();
    let merged = blocking(move || Ok(pdf::merge_pdfs(&documents)?)).await?;

    tracing::info!(documents = count, bytes = merged.len(), "Merged PDFs");

    attachment("application/pdf", "merged.pdf", merged)
}

/// Build one PDF per page group, returned as `extracted-pages.zip`
async fn extract_pages(multipart: Multipart) -> Result<Response> {
    let form = Form::read(multipart).await?;
    let data = form.pdf("file")?.data.clone();
    let raw = form
        .text("pageGroups")
        .ok_or_else(|| AppError::BadRequest("pageGroups parameter is required".to_string()))?;
    let groups = parse_page_groups(&raw)?;

    let (groups, zip) = blocking(move || {
        let outputs = pdf::extract_page_groups(&data, &groups)?;
        Ok((outputs.len(), archive::create_archive_with_prefix(&outputs, "group")?))
    })
    .await?;
    tracing::info!(groups, bytes = zip.len(), "Extracted page groups");

    attachment("application/zip", "extracted-pages.zip", zip)
}

/// Parse the `pageGroups` JSON field into integer groups.
///
/// Integral floats such as `1.0` count as integers. Range checks are left to
/// the extractor, which knows the page count.
fn parse_page_groups(raw: &str) -> Result<Vec<Vec<i64>>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|_| AppError::BadRequest("Invalid JSON format for pageGroups".to_string()))?;

    let groups = value
        .as_array()
        .ok_or_else(|| AppError::BadRequest("pageGroups must be an array of arrays".to_string()))?;

    groups
        .iter()
        .map(|group| {
            let indices = group.as_array().ok_or_else(|| {
                AppError::BadRequest("Each page group must be an array of page indices".to_string())
            })?;
            indices
                .iter()
                .map(|index| {
                    page_index(index).ok_or_else(|| {
                        AppError::BadRequest(format!(
                            "Invalid page index: {}. Must be an integer",
                            index
                        ))
                    })
                })
                .collect()
        })
        .collect()
}

fn page_index(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Print HTML or a URL to `document.pdf`
async fn from_html(
    State(state): State<AppState>,
    Json(request): Json<FromHtmlRequest>,
) -> Result<Response> {
    let source = RenderSource::from_fields(request.html, request.url)?;
    let options = PdfRenderOptions {
        format: request.format,
        landscape: request.landscape,
        print_background: request.print_background,
    };

    tracing::info!(?options, from_url = matches!(source, RenderSource::Url(_)), "Rendering PDF");

    let pdf = render::render_pdf(state.browser(), &source, &options).await?;

    attachment("application/pdf", "document.pdf", pdf)
}
