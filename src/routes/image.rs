//! Image API endpoints

use axum::{extract::Multipart, response::Response, routing::post, Json, Router};

use crate::error::{AppError, Result};
use crate::image_ops::{
    self, parse_hex_color, CropRegion, ImageMetadata, OutputFormat, ProcessOptions, ResizeFit,
    ResizeOptions,
};
use crate::routes::{attachment, blocking, form::Form};
use crate::state::AppState;

/// Create the image router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process", post(process_image))
        .route("/metadata", post(image_metadata))
}

/// Build pipeline options from the flat form fields.
///
/// A resize needs at least one of `resize_width`/`resize_height`; a crop
/// needs both `crop_width` and `crop_height`.
fn process_options(form: &Form) -> Result<ProcessOptions> {
    let resize_width = form.parse::<u32>("resize_width")?;
    let resize_height = form.parse::<u32>("resize_height")?;
    let resize = if resize_width.is_some() || resize_height.is_some() {
        let fit = match form.text("resize_fit") {
            None => ResizeFit::default(),
            Some(raw) => ResizeFit::parse(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid resize_fit '{}'", raw)))?,
        };
        let background = match form.text("resize_background") {
            None => None,
            Some(raw) => Some(
                parse_hex_color(&raw)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid resize_background '{}'", raw)))?,
            ),
        };
        Some(ResizeOptions {
            width: resize_width,
            height: resize_height,
            fit,
            background,
        })
    } else {
        None
    };

    let crop = match (form.parse::<u32>("crop_width")?, form.parse::<u32>("crop_height")?) {
        (Some(width), Some(height)) => Some(CropRegion {
            left: form.parse("crop_left")?.unwrap_or(0),
            top: form.parse("crop_top")?.unwrap_or(0),
            width,
            height,
        }),
        _ => None,
    };

    let format = match form.text("format") {
        None => None,
        Some(raw) => Some(OutputFormat::parse(&raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid format '{}': expected jpeg, png, webp, avif or tiff",
                raw
            ))
        })?),
    };

    let quality = form.parse::<u8>("quality")?;
    if quality.is_some_and(|q| !(1..=100).contains(&q)) {
        return Err(AppError::BadRequest("quality must be between 1 and 100".to_string()));
    }

    Ok(ProcessOptions {
        crop,
        resize,
        rotate: form.parse("rotate")?,
        grayscale: form.flag("grayscale"),
        format,
        quality,
    })
}

/// Apply crop/resize/rotate/grayscale/conversion to an uploaded image
async fn process_image(multipart: Multipart) -> Result<Response> {
    let form = Form::read(multipart).await?;
    let data = form.file("file", "Image file")?.data.clone();
    let options = process_options(&form)?;

    tracing::debug!(?options, bytes = data.len(), "Processing image");

    let processed = blocking(move || Ok(image_ops::process_image(&data, &options)?)).await?;

    let filename = format!("processed.{}", processed.format_name());
    attachment(processed.content_type(), &filename, processed.data)
}

/// Report format, dimensions and colour layout of an uploaded image
async fn image_metadata(multipart: Multipart) -> Result<Json<ImageMetadata>> {
    let form = Form::read(multipart).await?;
    let data = form.file("file", "Image file")?.data.clone();

    let metadata = blocking(move || Ok(image_ops::image_metadata(&data)?)).await?;

    Ok(Json(metadata))
}
