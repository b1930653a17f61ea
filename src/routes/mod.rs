//! Route modules for Docforge Server

pub mod form;
pub mod health;
pub mod image;
pub mod pdf;
pub mod scraper;
pub mod tools;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, StatusCode},
    response::Response,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_http::validate_request::ValidateRequestHeaderLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .merge(health::router())
        .nest("/api/scraper", scraper::router())
        .nest("/api/pdf", pdf::router())
        .nest("/api/image", image::router())
        .nest("/api/tools", tools::router())
        .layer(DefaultBodyLimit::max(state.config().server.max_upload_bytes));

    if let Some(token) = state.config().auth.api_key.as_deref() {
        tracing::info!("Bearer authentication enabled");
        router = router.layer(ValidateRequestHeaderLayer::bearer(token));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run CPU-bound work on the blocking pool so it never stalls request handling
pub async fn blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Internal(format!("Worker task failed: {}", e)))?
}

/// Binary download response with a `Content-Disposition` file name
pub fn attachment(content_type: &str, filename: &str, data: Vec<u8>) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
