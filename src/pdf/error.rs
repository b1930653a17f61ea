//! PDF error types

use thiserror::Error;

/// Errors from PDF page manipulation
#[derive(Debug, Error)]
pub enum PdfError {
    /// Bytes are not a readable PDF
    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),

    /// Malformed request (no groups, empty group, no documents)
    #[error("{0}")]
    InvalidInput(String),

    /// Page index outside `[0, page_count)`
    #[error("Page index {index} is out of range ({})", range_label(.page_count))]
    IndexOutOfRange { index: i64, page_count: usize },

    /// Serializing the output document failed
    #[error("Failed to write PDF: {0}")]
    Write(String),
}

fn range_label(page_count: &usize) -> String {
    match page_count {
        0 => "document has no pages".to_string(),
        n => format!("valid range: 0-{}", n - 1),
    }
}

impl PdfError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidDocument(_) | Self::InvalidInput(_) | Self::IndexOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
