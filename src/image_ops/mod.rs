//! Image tools
//!
//! Crop, resize, rotate, grayscale and format conversion of uploaded images,
//! plus metadata inspection. CPU-bound; callers run these on the blocking pool.

mod process;
mod types;

pub use process::{image_metadata, process_image};
pub use types::{
    format_name, parse_hex_color, CropRegion, ImageError, ImageMetadata, OutputFormat,
    ProcessOptions, ProcessedImage, ResizeFit, ResizeOptions, DEFAULT_QUALITY,
    MAX_OUTPUT_PIXELS,
};
