//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any pixels.

use crate::adjustments::CropSide;
use crate::types::PixelRect;

/// Where to cut from the source and where to place the cut on the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    /// Window to extract, in source coordinates.
    pub window: PixelRect,
    /// Output size (always the requested target size).
    pub output: (u32, u32),
    /// Top-left position of the window on the output canvas.
    pub paste: (u32, u32),
}

impl CropPlan {
    /// True when the window fills the output exactly (no black padding).
    pub fn is_exact(&self) -> bool {
        self.paste == (0, 0) && (self.window.width, self.window.height) == self.output
    }
}

/// Plan a crop of `source` to `target`, anchored at `side`.
///
/// When the target fits inside the source, the window is the target size.
/// When the target is larger along some axis, the largest available window
/// is taken on that axis (anchored the same way) and centered on a black
/// canvas of the target size.
///
/// # Examples
/// ```
/// # use retouch::adjustments::CropSide;
/// # use retouch::imaging::plan_crop;
/// // 100x80 source, 40x40 target, anchored at the top edge
/// let plan = plan_crop((100, 80), (40, 40), CropSide::Top);
/// assert_eq!((plan.window.x, plan.window.y), (30, 0));
/// ```
pub fn plan_crop(source: (u32, u32), target: (u32, u32), side: CropSide) -> CropPlan {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let win_w = tgt_w.min(src_w);
    let win_h = tgt_h.min(src_h);

    let centered_x = (src_w - win_w) / 2;
    let centered_y = (src_h - win_h) / 2;

    let (x, y) = match side {
        CropSide::Center => (centered_x, centered_y),
        CropSide::Top => (centered_x, 0),
        CropSide::Bottom => (centered_x, src_h - win_h),
        CropSide::Left => (0, centered_y),
        CropSide::Right => (src_w - win_w, centered_y),
    };

    CropPlan {
        window: PixelRect::new(x, y, win_w, win_h),
        output: target,
        paste: ((tgt_w - win_w) / 2, (tgt_h - win_h) / 2),
    }
}

/// Block grid for pixelation: the downsampled size for a block edge.
///
/// Never returns a zero dimension, so blocks larger than the image collapse
/// the whole axis into a single cell.
pub fn pixelation_grid(size: (u32, u32), block: u32) -> (u32, u32) {
    let block = block.max(1);
    ((size.0 / block).max(1), (size.1 / block).max(1))
}

/// Odd median-filter window edge for a noise-reduction intensity.
///
/// `3 + floor(4 * intensity)`, bumped to the next odd number.
pub fn median_window(intensity: f32) -> u32 {
    let size = 3 + (4.0 * intensity.clamp(0.0, 1.0)).floor() as u32;
    if size % 2 == 1 { size } else { size + 1 }
}
