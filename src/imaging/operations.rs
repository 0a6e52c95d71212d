//! Geometry operations: resampling, crop and pad.
//!
//! These combine the pure plans from [`calculations`](super::calculations)
//! with the `image` crate's resamplers.

use super::calculations::plan_crop;
use crate::adjustments::{AdjustmentError, CropSide, Geometry, ResizeMethod};
use crate::buffer::PixelBuffer;
use crate::types::PixelRect;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Resampling filter choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resampling {
    /// Bilinear (triangle): cheap, used for interactive frames.
    Bilinear,
    /// Lanczos3: high quality, used for committed renders.
    Lanczos,
    /// Nearest neighbour: blocky, used by pixelation.
    Nearest,
}

impl Resampling {
    fn filter(self) -> FilterType {
        match self {
            Resampling::Bilinear => FilterType::Triangle,
            Resampling::Lanczos => FilterType::Lanczos3,
            Resampling::Nearest => FilterType::Nearest,
        }
    }
}

/// Resample to exactly `width` × `height`.
///
/// Returns the input unchanged when the size already matches.
pub fn resample(buffer: &PixelBuffer, width: u32, height: u32, filter: Resampling) -> PixelBuffer {
    if buffer.dimensions() == (width, height) {
        return buffer.clone();
    }
    PixelBuffer::wrap(imageops::resize(
        buffer.as_image(),
        width.max(1),
        height.max(1),
        filter.filter(),
    ))
}

/// Copy a rectangular region out of a buffer.
pub fn extract(buffer: &PixelBuffer, rect: PixelRect) -> PixelBuffer {
    if (rect.x, rect.y) == (0, 0) && (rect.width, rect.height) == buffer.dimensions() {
        return buffer.clone();
    }
    let region = imageops::crop_imm(buffer.as_image(), rect.x, rect.y, rect.width, rect.height);
    PixelBuffer::wrap(region.to_image())
}

/// Crop to `target` anchored at `side`, padding with black where the target
/// exceeds the source.
pub fn crop_to(buffer: &PixelBuffer, target: (u32, u32), side: CropSide) -> PixelBuffer {
    let plan = plan_crop(buffer.dimensions(), target, side);
    let window = extract(buffer, plan.window);
    if plan.is_exact() {
        return window;
    }
    let mut canvas = RgbImage::new(plan.output.0, plan.output.1);
    imageops::replace(
        &mut canvas,
        window.as_image(),
        plan.paste.0 as i64,
        plan.paste.1 as i64,
    );
    PixelBuffer::wrap(canvas)
}

/// Apply the geometry step of the pipeline.
///
/// Disabled geometry (zero width or height) and a resize to the buffer's own
/// size both return the input untouched. Any other target must pass
/// [`Geometry::check_size`] before anything is allocated.
pub fn apply_geometry(
    buffer: &PixelBuffer,
    geometry: &Geometry,
    filter: Resampling,
) -> Result<PixelBuffer, AdjustmentError> {
    let target = (geometry.width, geometry.height);
    if !geometry.is_enabled() || target == buffer.dimensions() {
        return Ok(buffer.clone());
    }
    geometry.check_size()?;
    Ok(match geometry.method {
        ResizeMethod::Resize => resample(buffer, target.0, target.1, filter),
        ResizeMethod::Crop => crop_to(buffer, target, geometry.crop_side),
    })
}
