//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each entity (an edited file, a session, a rendered frame) leads with its
//! identity on a header line. Details follow as indented context lines, so
//! batch output reads as an inventory and still traces back to files.
//!
//! # Output Format
//!
//! ## Edit / Batch
//!
//! ```text
//! 001 dawn.jpg → out/dawn.jpg
//!     Effects: sepia, vignette
//!     Adjustments: brightness 0.20, contrast 0.10
//!     Output: 800x533
//! 002 dusk.png
//!     Failed: failed to decode image: ...
//!
//! Edited 1 image, 1 failed
//! ```
//!
//! ## Info
//!
//! ```text
//! dawn.jpg
//!     Size: 1600x1066
//!     Output: 800x533 (resize)
//!     Adjustments: none
//!     History: 1 of 10 snapshots, 0 undo steps
//!     Cache: 1 rendered
//! ```
//!
//! ## Preview
//!
//! ```text
//! Canvas 800x600 at zoom 1.50 (offset 0.0, 0.0)
//!     Crop: 266,177 533x400 (image pixels)
//!     Draw: 0,0 → 800,600 (canvas)
//!     Quality: full
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::ImageCodec;
use crate::session::ImageSession;
use crate::viewport::{DrawInstruction, RenderQuality, ViewportState};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn format_knobs(knobs: &[KnobValue]) -> String {
    if knobs.is_empty() {
        return "none".to_string();
    }
    knobs
        .iter()
        .map(|k| format!("{} {:.2}", k.name, k.value))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Session summary
// ============================================================================

/// A named knob and its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnobValue {
    pub name: String,
    pub value: f32,
}

/// Snapshot of a session's state for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Size after the geometry step, when geometry differs from native.
    pub output: Option<(u32, u32)>,
    pub resize_method: String,
    pub adjustments: Vec<KnobValue>,
    pub snapshots: usize,
    pub capacity: usize,
    pub undo_depth: usize,
    pub cache_hits: u32,
    pub cache_misses: u32,
}

impl SessionSummary {
    /// Summarise a loaded session. Returns `None` when nothing is loaded.
    pub fn from_session<C: ImageCodec>(source: &Path, session: &ImageSession<C>) -> Option<Self> {
        let working = session.working()?;
        let adjustments = session.adjustments()?;
        let (width, height) = working.dimensions();
        let geometry = adjustments.geometry();
        let output = (geometry.is_enabled() && (geometry.width, geometry.height) != (width, height))
            .then_some((geometry.width, geometry.height));
        let stats = session.cache_stats();
        Some(Self {
            source: source.to_path_buf(),
            width,
            height,
            output,
            resize_method: geometry.method.to_string(),
            adjustments: adjustments
                .active_knobs()
                .map(|(knob, value)| KnobValue {
                    name: knob.name().to_string(),
                    value,
                })
                .collect(),
            snapshots: session.history().len(),
            capacity: session.history().capacity(),
            undo_depth: session.history().undo_depth(),
            cache_hits: stats.hits,
            cache_misses: stats.misses,
        })
    }
}

/// Format the `info` display for one session.
pub fn format_session_info(summary: &SessionSummary) -> Vec<String> {
    let mut lines = vec![file_name(&summary.source)];
    lines.push(format!("{}Size: {}x{}", indent(1), summary.width, summary.height));
    if let Some((w, h)) = summary.output {
        lines.push(format!(
            "{}Output: {}x{} ({})",
            indent(1),
            w,
            h,
            summary.resize_method
        ));
    }
    lines.push(format!(
        "{}Adjustments: {}",
        indent(1),
        format_knobs(&summary.adjustments)
    ));
    lines.push(format!(
        "{}History: {} of {} snapshots, {}",
        indent(1),
        summary.snapshots,
        summary.capacity,
        plural(summary.undo_depth, "undo step")
    ));
    let stats = crate::cache::CacheStats {
        hits: summary.cache_hits,
        misses: summary.cache_misses,
    };
    lines.push(format!("{}Cache: {}", indent(1), stats));
    lines
}

pub fn print_session_info(summary: &SessionSummary) {
    for line in format_session_info(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Edit / batch
// ============================================================================

/// Outcome of editing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    Edited {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        effects: Vec<String>,
        adjustments: Vec<KnobValue>,
        dimensions: (u32, u32),
    },
    Failed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Format one edit event as display lines.
pub fn format_edit_event(event: &EditEvent) -> Vec<String> {
    match event {
        EditEvent::Edited {
            index,
            source,
            output,
            effects,
            adjustments,
            dimensions,
        } => {
            let mut lines = vec![format!(
                "{} {} → {}",
                format_index(*index),
                file_name(source),
                output.display()
            )];
            if !effects.is_empty() {
                lines.push(format!("{}Effects: {}", indent(1), effects.join(", ")));
            }
            if !adjustments.is_empty() {
                lines.push(format!(
                    "{}Adjustments: {}",
                    indent(1),
                    format_knobs(adjustments)
                ));
            }
            lines.push(format!(
                "{}Output: {}x{}",
                indent(1),
                dimensions.0,
                dimensions.1
            ));
            lines
        }
        EditEvent::Failed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

pub fn print_edit_event(event: &EditEvent) {
    for line in format_edit_event(event) {
        println!("{}", line);
    }
}

/// Closing line of a batch run.
pub fn format_batch_summary(edited: usize, failed: usize) -> String {
    let mut line = format!("Edited {}", plural(edited, "image"));
    if failed > 0 {
        line.push_str(&format!(", {failed} failed"));
    }
    line
}

// ============================================================================
// Preview
// ============================================================================

/// Geometry of a composed frame, without its pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub canvas: (f64, f64),
    pub zoom: f64,
    pub offset: (f64, f64),
    pub crop: crate::types::PixelRect,
    pub target: crate::types::CanvasRect,
    pub quality: &'static str,
    pub clip_points: usize,
}

impl FrameSummary {
    pub fn new(frame: &DrawInstruction, state: &ViewportState) -> Self {
        Self {
            canvas: state.canvas,
            zoom: state.zoom,
            offset: (state.offset.x, state.offset.y),
            crop: frame.crop_box,
            target: frame.target,
            quality: match frame.quality {
                RenderQuality::Fast => "fast",
                RenderQuality::Full => "full",
            },
            clip_points: frame.clip.len(),
        }
    }
}

pub fn format_frame(frame: &FrameSummary) -> Vec<String> {
    vec![
        format!(
            "Canvas {}x{} at zoom {:.2} (offset {:.1}, {:.1})",
            frame.canvas.0, frame.canvas.1, frame.zoom, frame.offset.0, frame.offset.1
        ),
        format!(
            "{}Crop: {},{} {}x{} (image pixels)",
            indent(1),
            frame.crop.x,
            frame.crop.y,
            frame.crop.width,
            frame.crop.height
        ),
        format!(
            "{}Draw: {},{} → {},{} (canvas)",
            indent(1),
            frame.target.left,
            frame.target.top,
            frame.target.right,
            frame.target.bottom
        ),
        format!("{}Quality: {}", indent(1), frame.quality),
    ]
}

pub fn print_frame(frame: &FrameSummary) {
    for line in format_frame(frame) {
        println!("{}", line);
    }
}

/// Shown when the image is entirely off-canvas.
pub fn format_empty_frame(state: &ViewportState) -> String {
    format!(
        "Canvas {}x{} at zoom {:.2}: nothing visible",
        state.canvas.0, state.canvas.1, state.zoom
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{Adjustment, Knob};
    use crate::test_helpers::{gradient, session_with};
    use crate::types::{CanvasRect, PixelRect};

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
        assert_eq!(plural(3, "undo step"), "3 undo steps");
    }

    // =========================================================================
    // Session info
    // =========================================================================

    #[test]
    fn info_for_fresh_session() {
        let session = session_with(gradient(64, 48));
        let summary = SessionSummary::from_session(Path::new("/tmp/dawn.png"), &session).unwrap();
        let lines = format_session_info(&summary);
        assert_eq!(
            lines,
            vec![
                "dawn.png",
                "    Size: 64x48",
                "    Adjustments: none",
                "    History: 1 of 10 snapshots, 0 undo steps",
                "    Cache: 0 rendered",
            ]
        );
    }

    #[test]
    fn info_shows_geometry_and_knobs() {
        let mut session = session_with(gradient(64, 48));
        session
            .set_adjustment(Adjustment::Tonal(Knob::Contrast, 0.5))
            .unwrap();
        session
            .set_adjustment(Adjustment::Tonal(Knob::Brightness, 0.25))
            .unwrap();
        session.set_adjustment(Adjustment::Width(32)).unwrap();
        let summary = SessionSummary::from_session(Path::new("dawn.png"), &session).unwrap();
        let lines = format_session_info(&summary);
        assert_eq!(lines[2], "    Output: 32x48 (resize)");
        // Pipeline order, not insertion order
        assert_eq!(lines[3], "    Adjustments: brightness 0.25, contrast 0.50");
    }

    #[test]
    fn summary_of_empty_session_is_none() {
        let session = ImageSession::new();
        assert!(SessionSummary::from_session(Path::new("x.png"), &session).is_none());
    }

    #[test]
    fn summary_serializes_to_json() {
        let session = session_with(gradient(8, 8));
        let summary = SessionSummary::from_session(Path::new("a.png"), &session).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["width"], 8);
        assert_eq!(json["snapshots"], 1);
        assert!(json["output"].is_null());
    }

    // =========================================================================
    // Edit events
    // =========================================================================

    #[test]
    fn format_edited_event() {
        let event = EditEvent::Edited {
            index: 1,
            source: PathBuf::from("in/dawn.jpg"),
            output: PathBuf::from("out/dawn.jpg"),
            effects: vec!["sepia".into(), "vignette".into()],
            adjustments: vec![KnobValue {
                name: "brightness".into(),
                value: 0.2,
            }],
            dimensions: (800, 533),
        };
        assert_eq!(
            format_edit_event(&event),
            vec![
                "001 dawn.jpg → out/dawn.jpg",
                "    Effects: sepia, vignette",
                "    Adjustments: brightness 0.20",
                "    Output: 800x533",
            ]
        );
    }

    #[test]
    fn format_edited_event_without_edits() {
        let event = EditEvent::Edited {
            index: 7,
            source: PathBuf::from("a.png"),
            output: PathBuf::from("b.png"),
            effects: vec![],
            adjustments: vec![],
            dimensions: (4, 4),
        };
        assert_eq!(
            format_edit_event(&event),
            vec!["007 a.png → b.png", "    Output: 4x4"]
        );
    }

    #[test]
    fn format_failed_event() {
        let event = EditEvent::Failed {
            index: 2,
            source: PathBuf::from("in/dusk.png"),
            error: "no image loaded".into(),
        };
        assert_eq!(
            format_edit_event(&event),
            vec!["002 dusk.png", "    Failed: no image loaded"]
        );
    }

    #[test]
    fn batch_summary_lines() {
        assert_eq!(format_batch_summary(1, 0), "Edited 1 image");
        assert_eq!(format_batch_summary(3, 2), "Edited 3 images, 2 failed");
    }

    // =========================================================================
    // Preview
    // =========================================================================

    #[test]
    fn format_frame_lines() {
        let frame = FrameSummary {
            canvas: (800.0, 600.0),
            zoom: 1.5,
            offset: (0.0, -10.0),
            crop: PixelRect::new(10, 20, 300, 200),
            target: CanvasRect::new(0.0, 0.0, 450.0, 300.0),
            quality: "full",
            clip_points: 64,
        };
        assert_eq!(
            format_frame(&frame),
            vec![
                "Canvas 800x600 at zoom 1.50 (offset 0.0, -10.0)",
                "    Crop: 10,20 300x200 (image pixels)",
                "    Draw: 0,0 → 450,300 (canvas)",
                "    Quality: full",
            ]
        );
    }

    #[test]
    fn empty_frame_line() {
        let state = ViewportState::default();
        assert_eq!(
            format_empty_frame(&state),
            "Canvas 800x600 at zoom 1.00: nothing visible"
        );
    }
}
