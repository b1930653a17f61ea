//! Utility endpoints

use axum::{response::Response, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::qr::{self, QrFormat, QrOptions};
use crate::routes::{attachment, blocking};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QrCodeRequest {
    pub text: String,
    #[serde(default)]
    pub format: QrFormat,
    pub width: Option<u32>,
    pub margin: Option<u32>,
    #[serde(default)]
    pub color: QrColors,
}

#[derive(Debug, Default, Deserialize)]
pub struct QrColors {
    pub dark: Option<String>,
    pub light: Option<String>,
}

/// Create the tools router
pub fn router() -> Router<AppState> {
    Router::new().route("/qrcode", post(qrcode))
}

/// Render a QR code as PNG or SVG
async fn qrcode(Json(request): Json<QrCodeRequest>) -> Result<Response> {
    let options = QrOptions {
        format: request.format,
        width: request.width,
        margin: request.margin,
        dark: request.color.dark,
        light: request.color.light,
    };

    tracing::debug!(chars = request.text.len(), format = ?options.format, "Generating QR code");

    let format = options.format;
    let text = request.text;
    let image = blocking(move || Ok(qr::render_qr(&text, &options)?)).await?;

    attachment(format.content_type(), format.file_name(), image)
}
