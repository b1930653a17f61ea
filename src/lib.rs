//! Docforge Server Library
//!
//! Document and web page transformation service. The HTTP binary lives in
//! main.rs; everything it serves is exposed here for integration tests.
//!
//! # Modules
//!
//! - `render`: Shared headless browser and the render operations on top of it
//! - `pdf`: Page-group extraction, split and merge
//! - `archive`: ZIP packaging of derived documents
//! - `image_ops`: Image conversion and metadata
//! - `qr`: QR code rendering
//! - `routes`: axum routers

pub mod archive;
pub mod config;
pub mod error;
pub mod image_ops;
pub mod pdf;
pub mod qr;
pub mod render;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
