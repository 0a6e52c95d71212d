//! Adjustment pipeline: working buffer + adjustments → processed buffer.
//!
//! The pipeline is a pure function. It applies the geometry step first and
//! then the non-zero tonal knobs in the fixed order given by
//! [`Knob::PIPELINE_ORDER`](crate::adjustments::Knob::PIPELINE_ORDER), each
//! step reading the previous step's output.
//!
//! ```text
//! working ──► geometry ──► brightness ──► contrast ──► … ──► warmth ──► processed
//!              (fast: bilinear, full: lanczos)     (zero knobs skipped)
//! ```
//!
//! Fast mode only changes the resampling filter of the geometry step; tonal
//! steps are identical in both modes. Fast mode is what the viewport asks for
//! on every interactive frame, so it must stay cheap.

use crate::adjustments::{AdjustmentError, AdjustmentSet};
use crate::buffer::PixelBuffer;
use crate::imaging::operations::{Resampling, apply_geometry};
use crate::imaging::tonal;

/// Resampling filter for the geometry step.
pub fn geometry_filter(fast: bool) -> Resampling {
    if fast {
        Resampling::Bilinear
    } else {
        Resampling::Lanczos
    }
}

/// Render the processed buffer.
///
/// Never mutates its inputs. With every knob at zero and native geometry the
/// result shares the working buffer's pixels. Fails only when the geometry
/// asks for an output larger than [`Geometry::MAX_PIXELS`](crate::adjustments::Geometry::MAX_PIXELS).
pub fn render(
    working: &PixelBuffer,
    adjustments: &AdjustmentSet,
    fast: bool,
) -> Result<PixelBuffer, AdjustmentError> {
    let mut out = apply_geometry(working, &adjustments.geometry(), geometry_filter(fast))?;
    for (knob, value) in adjustments.active_knobs() {
        out = tonal::apply(&out, knob, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{Adjustment, CropSide, Knob, ResizeMethod};
    use crate::test_helpers::{gradient, solid};

    #[test]
    fn identity_adjustments_share_pixels() {
        let img = gradient(20, 10);
        let adj = AdjustmentSet::for_size(20, 10);
        assert!(render(&img, &adj, false).unwrap().ptr_eq(&img));
        assert!(render(&img, &adj, true).unwrap().ptr_eq(&img));
    }

    #[test]
    fn brightness_then_contrast_order() {
        let img = solid(4, 4, [100, 100, 100]);
        let mut adj = AdjustmentSet::for_size(4, 4);
        adj.set(Knob::Brightness, 0.5);
        adj.set(Knob::Contrast, 1.0);
        // brightness: 150, contrast around its own mean (150): stays 150
        assert_eq!(render(&img, &adj, false).unwrap().pixel(0, 0), [150, 150, 150]);
    }

    #[test]
    fn knob_order_is_pipeline_order_not_insertion_order() {
        let img = solid(2, 2, [100, 60, 200]);
        let mut a = AdjustmentSet::for_size(2, 2);
        a.set(Knob::Warmth, 0.5);
        a.set(Knob::Brightness, 0.2);
        let mut b = AdjustmentSet::for_size(2, 2);
        b.set(Knob::Brightness, 0.2);
        b.set(Knob::Warmth, 0.5);
        assert_eq!(render(&img, &a, false).unwrap(), render(&img, &b, false).unwrap());
    }

    #[test]
    fn input_is_not_mutated() {
        let img = gradient(8, 8);
        let before = img.to_image();
        let mut adj = AdjustmentSet::for_size(8, 8);
        adj.set(Knob::Exposure, 0.7);
        adj.set(Knob::Hue, 0.3);
        let _ = render(&img, &adj, false).unwrap();
        assert_eq!(img.as_image(), &before);
    }

    #[test]
    fn geometry_runs_before_tonal_steps() {
        let img = gradient(40, 20);
        let mut adj = AdjustmentSet::for_size(40, 20);
        adj.apply(Adjustment::Width(10));
        adj.apply(Adjustment::Height(10));
        adj.apply(Adjustment::ResizeMethod(ResizeMethod::Crop));
        adj.apply(Adjustment::CropSide(CropSide::Left));
        adj.set(Knob::Brightness, -1.0);
        let out = render(&img, &adj, true).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.as_raw().iter().all(|&s| s == 0));
    }

    #[test]
    fn fast_and_full_differ_only_in_resampling() {
        let img = gradient(50, 50);
        let mut adj = AdjustmentSet::for_size(50, 50);
        adj.set(Knob::Saturation, 0.4);
        // No geometry change: both modes run identical tonal steps
        assert_eq!(render(&img, &adj, true).unwrap(), render(&img, &adj, false).unwrap());

        adj.apply(Adjustment::Width(17));
        adj.apply(Adjustment::Height(23));
        assert_eq!(render(&img, &adj, true).unwrap().dimensions(), (17, 23));
        assert_eq!(render(&img, &adj, false).unwrap().dimensions(), (17, 23));
    }
}
