//! Error types for the Docforge server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::image_ops::ImageError;
use crate::pdf::PdfError;
use crate::qr::QrError;
use crate::render::RenderError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Qr(#[from] QrError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable error type
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::UnsupportedMedia(_) => (StatusCode::BAD_REQUEST, "unsupported_media"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Multipart(e) => (e.status(), "bad_request"),
            AppError::Render(e) => {
                let kind = match e {
                    RenderError::InvalidInput(_) => "invalid_input",
                    RenderError::ResourceUnavailable(_) => "resource_unavailable",
                    RenderError::NavigationTimeout(_) => "navigation_timeout",
                    RenderError::Navigation(_) => "navigation_failed",
                    RenderError::Render(_) => "render_failed",
                };
                (e.status_code(), kind)
            }
            AppError::Pdf(e) => {
                let kind = match e {
                    PdfError::InvalidDocument(_) => "invalid_document",
                    PdfError::InvalidInput(_) => "invalid_input",
                    PdfError::IndexOutOfRange { .. } => "index_out_of_range",
                    PdfError::Write(_) => "pdf_error",
                };
                (e.status_code(), kind)
            }
            AppError::Archive(_) => (StatusCode::INTERNAL_SERVER_ERROR, "archive_error"),
            AppError::Image(e) => {
                let kind = match e {
                    ImageError::InvalidInput(_) => "invalid_input",
                    ImageError::Decode(_) => "invalid_image",
                    ImageError::Encode(_) => "image_error",
                };
                (e.status_code(), kind)
            }
            AppError::Qr(e) => {
                let kind = match e {
                    QrError::InvalidInput(_) => "invalid_input",
                    QrError::Encode(_) => "qrcode_error",
                };
                (e.status_code(), kind)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();

        let message = if status.is_server_error() {
            match status {
                StatusCode::INTERNAL_SERVER_ERROR => {
                    tracing::error!(error = %self, "Request failed");
                    "An internal error occurred".to_string()
                }
                // Upstream browser failures are the caller's to see
                _ => {
                    tracing::warn!(error = %self, "Upstream failure");
                    self.to_string()
                }
            }
        } else {
            tracing::debug!(error = %self, "Rejected request");
            match &self {
                AppError::BadRequest(msg) | AppError::UnsupportedMedia(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) && status == StatusCode::INTERNAL_SERVER_ERROR {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
