//! Image encoding: input image → bounded base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request body.
//! Inputs arrive in whatever format the user uploaded (JPEG photos, TIFF
//! scans, WebP screenshots), so every image is decoded, capped to
//! `max_pixels` on its longer side and re-encoded as lossless PNG.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Decode `bytes`, bound the longer side to `max_pixels` and encode for the
/// vision API.
pub fn encode_image(bytes: &[u8], max_pixels: u32) -> Result<ImageData, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let img = bound_dimensions(img, max_pixels);

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

fn bound_dimensions(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_pixels {
        return img;
    }
    img.resize(max_pixels, max_pixels, image::imageops::FilterType::Lanczos3)
}
