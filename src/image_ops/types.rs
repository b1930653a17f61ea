//! Image processing types

use serde::Serialize;

/// Default quality for lossy encoders when none is requested
pub const DEFAULT_QUALITY: u8 = 80;

/// Largest resize output in pixels (about 8000x5000)
pub const MAX_OUTPUT_PIXELS: u64 = 40_000_000;

/// Output formats a caller may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
    Tiff,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            "tiff" | "tif" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Avif => image::ImageFormat::Avif,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// How a resize fits the requested box when both dimensions are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFit {
    /// Fill the box, cropping the overflow around the centre
    #[default]
    Cover,
    /// Fit inside the box, padding the remainder with the background
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio
    Fill,
    /// Fit inside the box without padding
    Inside,
    /// Cover the box without cropping
    Outside,
}

impl ResizeFit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cover" => Some(Self::Cover),
            "contain" => Some(Self::Contain),
            "fill" => Some(Self::Fill),
            "inside" => Some(Self::Inside),
            "outside" => Some(Self::Outside),
            _ => None,
        }
    }
}

/// Region to cut out of the source image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: ResizeFit,
    /// RGBA padding colour for `Contain`; opaque black when unset
    pub background: Option<[u8; 4]>,
}

/// Processing pipeline, applied as crop, resize, rotate, grayscale, encode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessOptions {
    pub crop: Option<CropRegion>,
    pub resize: Option<ResizeOptions>,
    /// Clockwise degrees; must be a multiple of 90
    pub rotate: Option<i32>,
    pub grayscale: bool,
    pub format: Option<OutputFormat>,
    /// Only honoured together with `format`
    pub quality: Option<u8>,
}

/// Encoded result of a processing pipeline
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub format: image::ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn format_name(&self) -> &'static str {
        format_name(self.format)
    }
}

/// Image metadata as reported by `/api/image/metadata`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub space: String,
    pub channels: u8,
    pub has_alpha: bool,
    pub size: usize,
}

/// Image error types
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unsupported or corrupt image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

impl ImageError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidInput(_) | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Short lowercase name for a format, as used in file extensions
pub fn format_name(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Jpeg => "jpeg",
        image::ImageFormat::Png => "png",
        image::ImageFormat::WebP => "webp",
        image::ImageFormat::Avif => "avif",
        image::ImageFormat::Tiff => "tiff",
        image::ImageFormat::Gif => "gif",
        image::ImageFormat::Bmp => "bmp",
        other => other.extensions_str().first().copied().unwrap_or("bin"),
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional) into RGBA.
pub fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.trim().trim_start_matches('#');
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };

    Some([channel(0)?, channel(2)?, channel(4)?, alpha])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some([255, 0, 0, 255]));
        assert_eq!(parse_hex_color("00ff0080"), Some([0, 255, 0, 128]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("webp"), Some(OutputFormat::Webp));
        assert_eq!(OutputFormat::parse("gif"), None);
    }

    #[test]
    fn test_resize_fit_parse() {
        assert_eq!(ResizeFit::parse("contain"), Some(ResizeFit::Contain));
        assert_eq!(ResizeFit::parse("stretch"), None);
        assert_eq!(ResizeFit::default(), ResizeFit::Cover);
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let meta = ImageMetadata {
            format: "png".into(),
            width: 1,
            height: 1,
            space: "srgb".into(),
            channels: 4,
            has_alpha: true,
            size: 10,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["hasAlpha"], true);
    }
}
