//! QR code rendering
//!
//! Encodes text with `qrcode` and draws the module grid as PNG (via `image`)
//! or SVG. Margins are measured in modules, widths in pixels.

use std::fmt::Write as _;
use std::io::Cursor;

use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};
use serde::Deserialize;
use thiserror::Error;

use crate::image_ops::parse_hex_color;

/// Quiet zone width in modules when none is requested
pub const DEFAULT_MARGIN: u32 = 4;

/// Pixels per module when no width is requested
pub const DEFAULT_SCALE: u32 = 4;

/// Largest accepted output width in pixels
pub const MAX_WIDTH: u32 = 4096;

/// Largest accepted quiet zone in modules
pub const MAX_MARGIN: u32 = 64;

const DEFAULT_DARK: [u8; 4] = [0, 0, 0, 255];
const DEFAULT_LIGHT: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Png => "qrcode.png",
            Self::Svg => "qrcode.svg",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QrOptions {
    pub format: QrFormat,
    /// Minimum image width in pixels
    pub width: Option<u32>,
    /// Quiet zone in modules; 0 disables it
    pub margin: Option<u32>,
    /// `#rrggbb` or `#rrggbbaa`
    pub dark: Option<String>,
    pub light: Option<String>,
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to encode QR code: {0}")]
    Encode(String),
}

impl QrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Render `text` as a QR code image in the requested format.
pub fn render_qr(text: &str, options: &QrOptions) -> Result<Vec<u8>, QrError> {
    if text.is_empty() {
        return Err(QrError::InvalidInput("Text is required".to_string()));
    }

    let dark = color_option(options.dark.as_deref(), DEFAULT_DARK, "dark")?;
    let light = color_option(options.light.as_deref(), DEFAULT_LIGHT, "light")?;
    let margin = options.margin.unwrap_or(DEFAULT_MARGIN);
    if margin > MAX_MARGIN {
        return Err(QrError::InvalidInput(format!(
            "Margin must not exceed {} modules",
            MAX_MARGIN
        )));
    }

    let code = QrCode::new(text.as_bytes()).map_err(|e| QrError::InvalidInput(e.to_string()))?;
    let grid = Grid::new(&code, margin);

    let scale = match options.width {
        Some(0) => return Err(QrError::InvalidInput("Width must be positive".to_string())),
        Some(w) if w > MAX_WIDTH => {
            return Err(QrError::InvalidInput(format!(
                "Width must not exceed {} pixels",
                MAX_WIDTH
            )))
        }
        // Round up to reach the requested width, down if that would pass the limit
        Some(w) => {
            let up = w.div_ceil(grid.size);
            if up.saturating_mul(grid.size) > MAX_WIDTH {
                (MAX_WIDTH / grid.size).max(1)
            } else {
                up.max(1)
            }
        }
        None => DEFAULT_SCALE,
    };

    match grid.size.checked_mul(scale) {
        Some(side) if side <= MAX_WIDTH => {}
        _ => {
            return Err(QrError::InvalidInput(format!(
                "QR code would exceed {} pixels",
                MAX_WIDTH
            )))
        }
    }

    tracing::debug!(
        modules = code.width(),
        margin,
        scale,
        format = ?options.format,
        "Rendering QR code"
    );

    match options.format {
        QrFormat::Png => grid.to_png(scale, dark, light),
        QrFormat::Svg => Ok(grid.to_svg(scale, dark, light).into_bytes()),
    }
}

fn color_option(value: Option<&str>, default: [u8; 4], name: &str) -> Result<[u8; 4], QrError> {
    match value {
        None => Ok(default),
        Some(hex) => parse_hex_color(hex).ok_or_else(|| {
            QrError::InvalidInput(format!(
                "Invalid {} color '{}': expected #rrggbb or #rrggbbaa",
                name, hex
            ))
        }),
    }
}

/// Module grid including the quiet zone
struct Grid {
    /// Side length in modules
    size: u32,
    dark: Vec<bool>,
}

impl Grid {
    /// `margin` is bounded by [`MAX_MARGIN`] and `code` by QR version 40
    fn new(code: &QrCode, margin: u32) -> Self {
        let modules = code.width();
        let margin = margin as usize;
        let size = modules + 2 * margin;
        let mut dark = vec![false; size * size];

        for (i, color) in code.to_colors().into_iter().enumerate() {
            if color == Color::Dark {
                let x = i % modules + margin;
                let y = i / modules + margin;
                dark[y * size + x] = true;
            }
        }

        Self {
            size: size as u32,
            dark,
        }
    }

    fn is_dark(&self, x: u32, y: u32) -> bool {
        self.dark[y as usize * self.size as usize + x as usize]
    }

    fn to_png(&self, scale: u32, dark: [u8; 4], light: [u8; 4]) -> Result<Vec<u8>, QrError> {
        let side = self.size * scale;
        let img = RgbaImage::from_fn(side, side, |px, py| {
            if self.is_dark(px / scale, py / scale) {
                Rgba(dark)
            } else {
                Rgba(light)
            }
        });

        let mut output = Vec::new();
        img.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
            .map_err(|e| QrError::Encode(e.to_string()))?;
        Ok(output)
    }

    fn to_svg(&self, scale: u32, dark: [u8; 4], light: [u8; 4]) -> String {
        let side = self.size * scale;
        let mut path = String::new();
        for y in 0..self.size {
            for x in 0..self.size {
                if self.is_dark(x, y) {
                    let _ = write!(path, "M{} {}h1v1h-1z", x, y);
                }
            }
        }

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{side}" height="{side}" "#,
                r#"viewBox="0 0 {size} {size}" shape-rendering="crispEdges">"#,
                r#"<rect width="100%" height="100%" {light}/>"#,
                r#"<path d="{path}" {dark}/>"#,
                "</svg>\n"
            ),
            side = side,
            size = self.size,
            light = svg_fill(light),
            dark = svg_fill(dark),
            path = path,
        )
    }
}

fn svg_fill([r, g, b, a]: [u8; 4]) -> String {
    if a == 255 {
        format!(r##"fill="#{:02x}{:02x}{:02x}""##, r, g, b)
    } else {
        format!(
            r##"fill="#{:02x}{:02x}{:02x}" fill-opacity="{:.3}""##,
            r,
            g,
            b,
            a as f32 / 255.0
        )
    }
}
