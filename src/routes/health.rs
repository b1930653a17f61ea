//! Service index and health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub url: String,
    pub health: &'static str,
    pub endpoints: Vec<&'static str>,
}

const ENDPOINTS: [&str; 9] = [
    "POST /api/scraper/screenshot",
    "POST /api/scraper/content",
    "POST /api/pdf/split",
    "POST /api/pdf/merge",
    "POST /api/pdf/extract",
    "POST /api/pdf/from-html",
    "POST /api/image/process",
    "POST /api/image/metadata",
    "POST /api/tools/qrcode",
];

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Docforge - document and web page transformation API",
        version: env!("CARGO_PKG_VERSION"),
        url: state.config().server.public_url.clone(),
        health: "/health",
        endpoints: ENDPOINTS.to_vec(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
}
