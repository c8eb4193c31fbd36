//! Cover-fit resizing anchored to the top edge
//!
//! The source is scaled, preserving its aspect ratio, until it covers the
//! target box. Overflow is then cropped: everything below the box and an
//! equal share from the left and right. The top edge is never cropped, so a
//! tall full-page capture keeps its header.
//!
//! Every allocation is bounded by [`ResizeLimits`]: the target box is checked
//! before decoding, the decoder runs under an allocation cap and the scaled
//! intermediate is checked before it is created.

use crate::{CaptureError, OutputSize, ResizeLimits};
use image::imageops::FilterType;
use image::io::{Limits, Reader};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Geometry of a cover-top resize: scaled size, then the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverPlan {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
}

impl CoverPlan {
    pub fn new(source: (u32, u32), target: OutputSize) -> Self {
        let (source_width, source_height) = source;
        let scale = f64::max(
            target.width as f64 / source_width as f64,
            target.height as f64 / source_height as f64,
        );

        // Rounding can land one pixel short of the box; clamp up.
        let scaled_width = ((source_width as f64 * scale).round() as u32).max(target.width);
        let scaled_height = ((source_height as f64 * scale).round() as u32).max(target.height);

        Self {
            scaled_width,
            scaled_height,
            crop_x: (scaled_width - target.width) / 2,
            crop_y: 0,
        }
    }
}

/// Decode `png`, cover-fit it to `target` and re-encode as PNG.
///
/// Returns the input untouched when it already has the target dimensions.
pub fn cover_top(
    png: &[u8],
    target: OutputSize,
    limits: ResizeLimits,
) -> Result<Vec<u8>, CaptureError> {
    if target.width == 0 || target.height == 0 {
        return Err(CaptureError::ImageProcessing(format!(
            "output size {}x{} is empty",
            target.width, target.height
        )));
    }
    limits.check(target.width, target.height)?;

    let source = decode(png, limits)?;
    if source.dimensions() == (target.width, target.height) {
        return Ok(png.to_vec());
    }

    let resized = cover_top_image(&source, target, limits)?;

    let mut encoded = Vec::new();
    resized.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
    Ok(encoded)
}

pub fn cover_top_image(
    source: &DynamicImage,
    target: OutputSize,
    limits: ResizeLimits,
) -> Result<DynamicImage, CaptureError> {
    limits.check(target.width, target.height)?;
    let plan = CoverPlan::new(source.dimensions(), target);

    if (plan.scaled_width, plan.scaled_height) == source.dimensions() {
        return Ok(source.crop_imm(plan.crop_x, plan.crop_y, target.width, target.height));
    }

    limits.check(plan.scaled_width, plan.scaled_height)?;
    let scaled = source.resize_exact(plan.scaled_width, plan.scaled_height, FilterType::Lanczos3);

    Ok(scaled.crop_imm(plan.crop_x, plan.crop_y, target.width, target.height))
}

fn decode(png: &[u8], limits: ResizeLimits) -> Result<DynamicImage, CaptureError> {
    // RGBA8 is the widest layout Chrome produces.
    let mut decode_limits = Limits::default();
    decode_limits.max_alloc = Some(limits.max_pixels.saturating_mul(4));

    let mut reader = Reader::with_format(Cursor::new(png), ImageFormat::Png);
    reader.limits(decode_limits);
    Ok(reader.decode()?)
}
