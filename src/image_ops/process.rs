//! Image pipeline built on the `image` crate

use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageReader, Rgba, RgbaImage};

use super::types::{
    format_name, CropRegion, ImageError, ImageMetadata, OutputFormat, ProcessOptions,
    ProcessedImage, ResizeFit, ResizeOptions, DEFAULT_QUALITY, MAX_OUTPUT_PIXELS,
};

const FILTER: FilterType = FilterType::Lanczos3;

/// AVIF encoder speed (1 slowest .. 10 fastest)
const AVIF_SPEED: u8 = 8;

/// Apply `options` to an encoded image and re-encode it.
///
/// Without an output format the result keeps the input's format.
pub fn process_image(bytes: &[u8], options: &ProcessOptions) -> Result<ProcessedImage, ImageError> {
    let input_format =
        image::guess_format(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let mut img =
        image::load_from_memory_with_format(bytes, input_format).map_err(|e| ImageError::Decode(e.to_string()))?;

    if let Some(region) = options.crop {
        img = crop(&img, region)?;
    }
    if let Some(resize_options) = &options.resize {
        img = resize(img, resize_options)?;
    }
    if let Some(degrees) = options.rotate {
        img = rotate(img, degrees)?;
    }
    if options.grayscale {
        img = img.grayscale();
    }

    let (data, format) = match options.format {
        Some(format) => (encode(&img, format, options.quality)?, format.image_format()),
        None => (encode_as(&img, input_format)?, input_format),
    };

    tracing::debug!(
        input = format_name(input_format),
        output = format_name(format),
        width = img.width(),
        height = img.height(),
        bytes = data.len(),
        "Image processed"
    );

    Ok(ProcessedImage {
        data,
        format,
        width: img.width(),
        height: img.height(),
    })
}

/// Read format, dimensions and colour layout.
pub fn image_metadata(bytes: &[u8]) -> Result<ImageMetadata, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::Decode("unrecognized image format".to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let (width, height) = img.dimensions();
    let color = img.color();
    let space = if color.has_color() { "srgb" } else { "b-w" };

    Ok(ImageMetadata {
        format: format_name(format).to_string(),
        width,
        height,
        space: space.to_string(),
        channels: color.channel_count(),
        has_alpha: color.has_alpha(),
        size: bytes.len(),
    })
}

fn crop(img: &DynamicImage, region: CropRegion) -> Result<DynamicImage, ImageError> {
    let (width, height) = img.dimensions();
    let fits = region.width > 0
        && region.height > 0
        && region.left.checked_add(region.width).is_some_and(|right| right <= width)
        && region.top.checked_add(region.height).is_some_and(|bottom| bottom <= height);

    if !fits {
        return Err(ImageError::InvalidInput(format!(
            "Crop region {}x{}+{}+{} is outside the {}x{} image",
            region.width, region.height, region.left, region.top, width, height
        )));
    }

    Ok(img.crop_imm(region.left, region.top, region.width, region.height))
}

fn resize(img: DynamicImage, options: &ResizeOptions) -> Result<DynamicImage, ImageError> {
    let (src_w, src_h) = img.dimensions();
    if options.width == Some(0) || options.height == Some(0) {
        return Err(ImageError::InvalidInput(
            "Resize dimensions must be positive".to_string(),
        ));
    }

    let (width, height) = match (options.width, options.height) {
        (None, None) => return Ok(img),
        // One side given: scale proportionally whatever the fit
        (Some(w), None) => {
            let h = scaled(src_h, w, src_w);
            check_pixels(w as u64, h as u64)?;
            return Ok(img.resize_exact(w, h as u32, FILTER));
        }
        (None, Some(h)) => {
            let w = scaled(src_w, h, src_h);
            check_pixels(w as u64, h as u64)?;
            return Ok(img.resize_exact(w as u32, h, FILTER));
        }
        (Some(w), Some(h)) => (w, h),
    };

    check_pixels(width as u64, height as u64)?;
    // Cover scales to this size before cropping, Outside keeps it
    let (out_w, out_h) = outside_size(src_w, src_h, width, height);
    if matches!(options.fit, ResizeFit::Cover | ResizeFit::Outside) {
        check_pixels(out_w, out_h)?;
    }

    let resized = match options.fit {
        ResizeFit::Fill => img.resize_exact(width, height, FILTER),
        ResizeFit::Cover => img.resize_to_fill(width, height, FILTER),
        ResizeFit::Inside => img.resize(width, height, FILTER),
        ResizeFit::Outside => img.resize_exact(out_w as u32, out_h as u32, FILTER),
        ResizeFit::Contain => {
            let inner = img.resize(width, height, FILTER);
            let background = options.background.unwrap_or([0, 0, 0, 255]);
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba(background));
            let x = (width - inner.width()) / 2;
            let y = (height - inner.height()) / 2;
            imageops::overlay(&mut canvas, &inner.to_rgba8(), x as i64, y as i64);
            DynamicImage::ImageRgba8(canvas)
        }
    };

    Ok(resized)
}

/// `other * target / source`, rounded, at least 1
fn scaled(other: u32, target: u32, source: u32) -> u64 {
    ((other as u64 * target as u64 + source as u64 / 2) / source.max(1) as u64).max(1)
}

/// Smallest size keeping the aspect ratio that covers `width` x `height`
fn outside_size(src_w: u32, src_h: u32, width: u32, height: u32) -> (u64, u64) {
    let scale = f64::max(width as f64 / src_w as f64, height as f64 / src_h as f64);
    let side = |src: u32| ((src as f64 * scale).round() as u64).max(1);
    (side(src_w), side(src_h))
}

fn check_pixels(width: u64, height: u64) -> Result<(), ImageError> {
    if width > u32::MAX as u64
        || height > u32::MAX as u64
        || width.saturating_mul(height) > MAX_OUTPUT_PIXELS
    {
        return Err(ImageError::InvalidInput(format!(
            "Resize to {}x{} exceeds the {} pixel limit",
            width, height, MAX_OUTPUT_PIXELS
        )));
    }
    Ok(())
}

fn rotate(img: DynamicImage, degrees: i32) -> Result<DynamicImage, ImageError> {
    match degrees.rem_euclid(360) {
        0 => Ok(img),
        90 => Ok(img.rotate90()),
        180 => Ok(img.rotate180()),
        270 => Ok(img.rotate270()),
        _ => Err(ImageError::InvalidInput(format!(
            "Rotation must be a multiple of 90 degrees, got {}",
            degrees
        ))),
    }
}

/// Most encoders only take 8-bit buffers
fn to_8bit(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img.clone(),
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(img.to_luma8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        _ if img.color().has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: Option<u8>) -> Result<Vec<u8>, ImageError> {
    let quality = quality.unwrap_or(DEFAULT_QUALITY).clamp(1, 100);
    let mut output = Vec::new();
    let mut cursor = Cursor::new(&mut output);

    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let flat = if img.color().has_color() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(img.to_luma8())
            };
            flat.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality))
        }
        OutputFormat::Png => to_8bit(img).write_with_encoder(PngEncoder::new(&mut cursor)),
        OutputFormat::Webp => to_8bit(img).write_with_encoder(WebPEncoder::new_lossless(&mut cursor)),
        OutputFormat::Avif => {
            let rgb = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            rgb.write_with_encoder(AvifEncoder::new_with_speed_quality(&mut cursor, AVIF_SPEED, quality))
        }
        OutputFormat::Tiff => to_8bit(img).write_with_encoder(TiffEncoder::new(&mut cursor)),
    };

    result.map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(output)
}

fn encode_as(img: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>, ImageError> {
    if let Some(known) = OutputFormat::parse(format_name(format)) {
        return encode(img, known, None);
    }

    let mut output = Vec::new();
    to_8bit(img)
        .write_to(&mut Cursor::new(&mut output), format)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(output)
}
