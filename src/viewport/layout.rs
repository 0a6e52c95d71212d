//! Pure viewport geometry: where the image lands on the canvas and which
//! part of it is visible.
//!
//! Canvas space has its origin at the top-left of the canvas. The image is
//! placed with its centre at `canvas_centre + offset`, scaled by `zoom`.

use crate::types::{CanvasRect, PixelRect, Point};

/// Smallest zoom at which the image is still drawn at half the size that
/// would fit the canvas.
pub fn min_zoom(canvas: (f64, f64), image: (u32, u32)) -> f64 {
    let fit_x = canvas.0 / f64::from(image.0.max(1));
    let fit_y = canvas.1 / f64::from(image.1.max(1));
    fit_x.min(fit_y) / 2.0
}

/// Result of projecting an image onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Part of the canvas covered by the image.
    pub visible: CanvasRect,
    /// Source region in image pixels.
    pub crop_box: PixelRect,
    /// Size to resample the source region to.
    pub target_size: (u32, u32),
}

/// Map an image at `zoom`/`offset` onto the canvas.
///
/// Returns `None` when nothing of the image is visible, or when the visible
/// part rounds down to an empty crop or an empty draw size.
pub fn project(canvas: (f64, f64), image: (u32, u32), zoom: f64, offset: Point) -> Option<Projection> {
    let (cw, ch) = canvas;
    let (iw, ih) = (f64::from(image.0), f64::from(image.1));

    let centre = Point::new(cw / 2.0 + offset.x, ch / 2.0 + offset.y);
    let scaled_w = (iw * zoom).trunc();
    let scaled_h = (ih * zoom).trunc();
    let placed = CanvasRect::new(
        centre.x - scaled_w / 2.0,
        centre.y - scaled_h / 2.0,
        centre.x + scaled_w / 2.0,
        centre.y + scaled_h / 2.0,
    );

    let visible = placed.intersect(&CanvasRect::new(0.0, 0.0, cw, ch));
    if visible.is_empty() {
        return None;
    }

    let crop_left = ((visible.left - placed.left) / zoom).max(0.0);
    let crop_top = ((visible.top - placed.top) / zoom).max(0.0);
    let crop_right = ((visible.right - placed.left) / zoom).min(iw);
    let crop_bottom = ((visible.bottom - placed.top) / zoom).min(ih);
    if crop_right <= crop_left || crop_bottom <= crop_top {
        return None;
    }

    let (x0, y0) = (crop_left as u32, crop_top as u32);
    let (x1, y1) = (crop_right as u32, crop_bottom as u32);
    let target_w = ((crop_right - crop_left) * zoom) as u32;
    let target_h = ((crop_bottom - crop_top) * zoom) as u32;
    if x1 <= x0 || y1 <= y0 || target_w == 0 || target_h == 0 {
        return None;
    }

    Some(Projection {
        visible,
        crop_box: PixelRect::new(x0, y0, x1 - x0, y1 - y0),
        target_size: (target_w, target_h),
    })
}

/// Clip polygon for a canvas with rounded corners.
///
/// Each corner contributes `points_per_corner` points spaced `90° / n`
/// apart, starting at 90° (top-left), 0° (top-right), 270° (bottom-right)
/// and 180° (bottom-left) around that corner's circle centre.
pub fn rounded_rect_polygon(
    width: f64,
    height: f64,
    radius: f64,
    points_per_corner: u32,
) -> Vec<Point> {
    let step = 90.0 / f64::from(points_per_corner.max(1));
    let corners = [
        (90.0, Point::new(radius, radius)),
        (0.0, Point::new(width - radius, radius)),
        (270.0, Point::new(width - radius, height - radius)),
        (180.0, Point::new(radius, height - radius)),
    ];
    corners
        .iter()
        .flat_map(|&(start, centre)| {
            (0..points_per_corner).map(move |i| {
                let angle = (start + f64::from(i) * step).to_radians();
                Point::new(
                    centre.x + radius * angle.cos(),
                    centre.y + radius * angle.sin(),
                )
            })
        })
        .collect()
}
