//! # Retouch
//!
//! The core of a raster image editor: a loaded image, a set of
//! non-destructive tonal adjustments, a catalog of destructive effects with
//! bounded undo, and a viewport that projects the result onto a zoomable,
//! pannable canvas.
//!
//! # Architecture: Working Buffer Plus Derived Output
//!
//! A session keeps three buffers per document:
//!
//! ```text
//! original ──(effects, undo)──► working ──(adjustments)──► processed ──► viewport
//!                                  │                           │
//!                               history                      cache
//! ```
//!
//! - **original** is what was decoded and is never modified.
//! - **working** changes only through effects (each commits a history
//!   snapshot) and undo.
//! - **processed** is derived: geometry followed by twelve tonal steps in a
//!   fixed order, recomputed whenever it is asked for. A fast-mode render is
//!   cached until the working buffer or an adjustment changes.
//!
//! The viewport never edits anything. It asks the session for the processed
//! buffer and works out which pixels are visible at the current zoom and
//! pan.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`buffer`] | `PixelBuffer`: immutable RGB8 raster, cheap to clone |
//! | [`adjustments`] | Tonal knobs, output geometry, `name=value` parsing |
//! | [`imaging`] | Codecs, geometry operations, tonal steps, the effect catalog |
//! | [`pipeline`] | Geometry then tonal steps, in pipeline order |
//! | [`cache`] | Fast-render cache and hit/miss statistics |
//! | [`history`] | Bounded undo snapshots |
//! | [`session`] | `ImageSession`: the document and every edit operation |
//! | [`viewport`] | Zoom/pan projection, zoom animation, input rate limits |
//! | [`recipe`] | TOML edit recipes for headless runs |
//! | [`config`] | `config.toml` loading, validation, merging |
//! | [`types`] | Shared geometric value types |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Shared Pixels, Not Copies
//!
//! `PixelBuffer` wraps its image in an `Arc`. History snapshots, the cache
//! and the working buffer hand out clones of the same allocation, so keeping
//! ten undo steps of a large photo costs ten images, not twenty.
//!
//! ## A Closed Effect Catalog
//!
//! Effects are one enum with typed parameters, not a registry of trait
//! objects. Parameters are validated when they are constructed or
//! deserialized (`BlockSize` rejects 0, `Intensity` clamps), so applying an
//! effect cannot fail on a bad value. The same enum deserializes from
//! recipe files with `kind = "..."`.
//!
//! ## Time Is an Argument
//!
//! The viewport owns no timers. Interaction methods take the current
//! `Instant` and return whether a redraw is due, so the animation and the
//! drag and wheel rate limits are plain state machines that tests drive
//! with synthetic time.

pub mod adjustments;
pub mod buffer;
pub mod cache;
pub mod config;
pub mod history;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod recipe;
pub mod session;
pub mod types;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_helpers;
