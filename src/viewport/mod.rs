//! Viewport compositor: projects the processed image onto a zoomed, panned,
//! corner-clipped canvas.
//!
//! The viewport never edits the document. It asks the session for the
//! processed buffer, decides which part of it is visible, and produces a
//! [`DrawInstruction`] for whatever actually paints pixels.
//!
//! Interaction methods take the current [`Instant`] from the caller and
//! return a [`RenderQuality`] when a redraw is due:
//!
//! | Input | Effect | Redraw |
//! |---|---|---|
//! | [`on_wheel`](Viewport::on_wheel) | retarget zoom around the cursor, start animation | via [`tick`](Viewport::tick) |
//! | [`adjust_zoom`](Viewport::adjust_zoom) | retarget zoom, offset unchanged | via [`tick`](Viewport::tick) |
//! | [`on_drag_delta`](Viewport::on_drag_delta) | pan | fast, rate limited |
//! | [`end_drag`](Viewport::end_drag) | none | full |
//! | [`on_canvas_resize`](Viewport::on_canvas_resize) | new canvas size (empty sizes ignored) | full, unless a render is in progress |
//! | [`tick`](Viewport::tick) | advance animation | fast per frame, full on the last |

pub mod animation;
pub mod layout;

use crate::buffer::PixelBuffer;
use crate::imaging::ImageCodec;
use crate::imaging::operations::{Resampling, extract, resample};
use crate::session::{ImageSession, SessionError};
use crate::types::{CanvasRect, PixelRect, Point};
use animation::ZoomAnimator;
use std::time::{Duration, Instant};

/// Canvas size used until the first resize event arrives.
pub const DEFAULT_CANVAS: (f64, f64) = (800.0, 600.0);

/// Viewport tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSettings {
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub corner_radius: f64,
    pub corner_points: u32,
    pub animation_duration: Duration,
    pub animation_tick: Duration,
    pub drag_interval: Duration,
    pub wheel_debounce: Duration,
    pub render_budget: Duration,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            max_zoom: 10.0,
            zoom_step: 0.1,
            corner_radius: 15.0,
            corner_points: 16,
            animation_duration: Duration::from_millis(200),
            animation_tick: Duration::from_millis(10),
            drag_interval: Duration::from_millis(50),
            wheel_debounce: Duration::from_millis(50),
            render_budget: Duration::from_secs(5),
        }
    }
}

/// Zoom, pan and canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub zoom: f64,
    /// Goal of the running (or next) zoom animation.
    pub target_zoom: f64,
    /// Image centre relative to the canvas centre.
    pub offset: Point,
    pub canvas: (f64, f64),
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            target_zoom: 1.0,
            offset: Point::default(),
            canvas: DEFAULT_CANVAS,
        }
    }
}

/// How a redraw should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQuality {
    /// Interactive frame: cached pipeline output, bilinear resampling.
    Fast,
    /// Settled frame: full pipeline, Lanczos when magnifying.
    Full,
}

impl RenderQuality {
    pub fn is_fast(self) -> bool {
        self == RenderQuality::Fast
    }
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone)]
pub struct DrawInstruction {
    /// Region of the processed image that is visible, in image pixels.
    pub crop_box: PixelRect,
    /// Where to draw on the canvas (top-left anchored).
    pub target: CanvasRect,
    /// The cropped region, already resampled to the target size.
    pub buffer: PixelBuffer,
    /// Rounded-rectangle clip polygon in canvas coordinates.
    pub clip: Vec<Point>,
    pub quality: RenderQuality,
}

/// Viewport state plus interaction bookkeeping.
#[derive(Debug, Clone)]
pub struct Viewport {
    settings: ViewportSettings,
    state: ViewportState,
    image_size: Option<(u32, u32)>,
    animator: ZoomAnimator,
    dragging: bool,
    updating: bool,
    last_wheel: Option<Instant>,
    last_drag_render: Option<Instant>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportSettings::default())
    }
}

impl Viewport {
    pub fn new(settings: ViewportSettings) -> Self {
        let animator = ZoomAnimator::new(settings.animation_duration, settings.animation_tick);
        Self {
            settings,
            state: ViewportState::default(),
            image_size: None,
            animator,
            dragging: false,
            updating: false,
            last_wheel: None,
            last_drag_render: None,
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn is_zooming(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// How often [`tick`](Self::tick) should be called while zooming.
    pub fn tick_interval(&self) -> Duration {
        self.animator.tick_interval()
    }

    /// Current minimum zoom, or `None` before an image is known.
    pub fn min_zoom(&self) -> Option<f64> {
        self.image_size
            .map(|size| layout::min_zoom(self.state.canvas, size))
    }

    // =========================================================================
    // Document lifecycle
    // =========================================================================

    /// A new document was loaded: reset zoom and pan.
    pub fn on_document_loaded(&mut self, width: u32, height: u32) {
        self.image_size = Some((width, height));
        self.reset_view();
    }

    pub fn reset_view(&mut self) {
        self.animator.cancel();
        self.dragging = false;
        self.state.zoom = 1.0;
        self.state.target_zoom = 1.0;
        self.state.offset = Point::default();
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// New canvas size. Requests a full render unless one is in progress.
    ///
    /// An empty canvas (a minimised window) is ignored and the previous size
    /// kept, so the minimum zoom never reaches zero.
    pub fn on_canvas_resize(&mut self, width: f64, height: f64) -> Option<RenderQuality> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::debug!("ignoring canvas resize to {width}x{height}");
            return None;
        }
        self.state.canvas = (width, height);
        if self.updating || self.image_size.is_none() {
            return None;
        }
        Some(RenderQuality::Full)
    }

    /// Wheel zoom anchored at `cursor`. Positive `delta` zooms in.
    ///
    /// Returns `false` when the event was ignored (no image, debounce, or a
    /// zero delta).
    pub fn on_wheel(&mut self, delta: f64, cursor: Point, now: Instant) -> bool {
        let Some(min_zoom) = self.min_zoom() else {
            return false;
        };
        if let Some(last) = self.last_wheel
            && now.saturating_duration_since(last) < self.settings.wheel_debounce
        {
            return false;
        }
        self.last_wheel = Some(now);

        let step = if delta > 0.0 {
            self.settings.zoom_step
        } else if delta < 0.0 {
            -self.settings.zoom_step
        } else {
            return false;
        };

        let previous = self.state.zoom;
        self.state.target_zoom = self.clamp_zoom(previous + step, min_zoom);

        if previous <= 0.0 {
            self.animator.start(now, self.state.zoom);
            return true;
        }

        // Keep the image point under the cursor fixed
        let (cw, ch) = self.state.canvas;
        let centre = Point::new(cw / 2.0 + self.state.offset.x, ch / 2.0 + self.state.offset.y);
        let rel = Point::new(
            (cursor.x - centre.x) / previous,
            (cursor.y - centre.y) / previous,
        );
        self.state.offset = Point::new(
            cursor.x - rel.x * self.state.target_zoom - cw / 2.0,
            cursor.y - rel.y * self.state.target_zoom - ch / 2.0,
        );

        self.animator.start(now, self.state.zoom);
        true
    }

    /// Zoom buttons: change the target by `delta` without moving the offset.
    pub fn adjust_zoom(&mut self, delta: f64, now: Instant) -> bool {
        let Some(min_zoom) = self.min_zoom() else {
            return false;
        };
        self.state.target_zoom = self.clamp_zoom(self.state.zoom + delta, min_zoom);
        self.animator.start(now, self.state.zoom);
        true
    }

    pub fn begin_drag(&mut self) {
        if self.image_size.is_some() {
            self.dragging = true;
        }
    }

    /// Pan by `(dx, dy)`. Offsets always accumulate; a fast render is
    /// requested at most once per drag interval.
    pub fn on_drag_delta(&mut self, dx: f64, dy: f64, now: Instant) -> Option<RenderQuality> {
        if !self.dragging {
            return None;
        }
        self.state.offset.x += dx;
        self.state.offset.y += dy;
        let due = self
            .last_drag_render
            .is_none_or(|last| now.saturating_duration_since(last) >= self.settings.drag_interval);
        if !due {
            return None;
        }
        self.last_drag_render = Some(now);
        Some(RenderQuality::Fast)
    }

    /// Finish a drag. Always requests a full render.
    pub fn end_drag(&mut self) -> Option<RenderQuality> {
        self.dragging = false;
        self.image_size.map(|_| RenderQuality::Full)
    }

    /// Advance the zoom animation to `now`.
    ///
    /// Every frame requests a fast render; the last one snaps to the target
    /// and requests a full render.
    pub fn tick(&mut self, now: Instant) -> Option<RenderQuality> {
        let frame = self.animator.tick(now, self.state.target_zoom)?;
        self.state.zoom = frame.zoom;
        if frame.is_final() {
            self.state.zoom = self.state.target_zoom;
            Some(RenderQuality::Full)
        } else {
            Some(RenderQuality::Fast)
        }
    }

    fn clamp_zoom(&self, zoom: f64, min_zoom: f64) -> f64 {
        zoom.max(min_zoom).min(self.settings.max_zoom)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render a frame from the session's processed output.
    ///
    /// Returns `Ok(None)` when nothing is visible or another render is in
    /// progress, and [`SessionError::RenderTimeout`] when the frame took
    /// longer than the render budget.
    pub fn render<C: ImageCodec>(
        &mut self,
        session: &mut ImageSession<C>,
        quality: RenderQuality,
    ) -> Result<Option<DrawInstruction>, SessionError> {
        if self.updating {
            return Ok(None);
        }
        self.updating = true;
        let started = Instant::now();
        let result = session
            .processed(quality.is_fast())
            .map(|processed| self.compose(&processed, quality));
        self.updating = false;
        let frame = result?;
        check_budget(started, Instant::now(), self.settings.render_budget)?;
        Ok(frame)
    }

    /// Project an already processed buffer onto the canvas.
    ///
    /// Snaps zoom up to the minimum when not dragging and clamps it to the
    /// maximum before projecting.
    pub fn compose(&mut self, processed: &PixelBuffer, quality: RenderQuality) -> Option<DrawInstruction> {
        let size = processed.dimensions();
        self.image_size = Some(size);

        let min_zoom = layout::min_zoom(self.state.canvas, size);
        if self.state.zoom < min_zoom && !self.dragging {
            log::debug!("zoom {:.3} below minimum, snapping to {min_zoom:.3}", self.state.zoom);
            self.state.zoom = min_zoom;
            self.state.target_zoom = min_zoom;
        }
        self.state.zoom = self.state.zoom.min(self.settings.max_zoom);

        let projection = layout::project(self.state.canvas, size, self.state.zoom, self.state.offset)?;
        let filter = match quality {
            RenderQuality::Fast => Resampling::Bilinear,
            RenderQuality::Full if self.state.zoom > 1.0 => Resampling::Lanczos,
            RenderQuality::Full => Resampling::Bilinear,
        };
        let region = extract(processed, projection.crop_box);
        let (w, h) = projection.target_size;
        let buffer = resample(&region, w, h, filter);

        let origin = Point::new(projection.visible.left, projection.visible.top);
        Some(DrawInstruction {
            crop_box: projection.crop_box,
            target: CanvasRect::from_origin(origin, f64::from(w), f64::from(h)),
            buffer,
            clip: layout::rounded_rect_polygon(
                self.state.canvas.0,
                self.state.canvas.1,
                self.settings.corner_radius,
                self.settings.corner_points,
            ),
            quality,
        })
    }
}

/// Fail with [`SessionError::RenderTimeout`] when a render ran over budget.
pub fn check_budget(started: Instant, finished: Instant, budget: Duration) -> Result<(), SessionError> {
    let elapsed = finished.saturating_duration_since(started);
    if elapsed > budget {
        log::warn!("render took {elapsed:?}, budget is {budget:?}");
        return Err(SessionError::RenderTimeout { elapsed, budget });
    }
    Ok(())
}
