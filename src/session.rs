//! Editing session: one open document and its edit state.
//!
//! An [`ImageSession`] owns everything that changes while a document is
//! edited:
//!
//! - `original`: the decoded file, fixed for the life of the document
//! - `working`: the committed edit state, replaced by destructive effects
//!   and undo
//! - `adjustments`: the continuous knobs applied on top of `working`
//! - the fast-preview [`RenderCache`] and the snapshot [`History`]
//!
//! ```text
//!   load ──► original ──► working ──┬──► pipeline(adjustments) ──► processed
//!                           ▲       │
//!            apply_effect ──┘       └──► history.commit
//!            undo ◄──────────────────── history.undo
//! ```
//!
//! Every mutation that could change the processed output invalidates the
//! cache. Fallible operations compute their result first and only then touch
//! session state, so an error never leaves the session half-updated.

use crate::adjustments::{Adjustment, AdjustmentError, AdjustmentSet};
use crate::buffer::PixelBuffer;
use crate::cache::{CacheStats, RenderCache};
use crate::history::{DEFAULT_CAPACITY, History};
use crate::imaging::effects::{self, ColorMatchParams, Effect, EffectError};
use crate::imaging::{CodecError, ImageCodec, RustCodec};
use crate::pipeline;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] CodecError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] CodecError),
    #[error("no image loaded")]
    NoImageLoaded,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown adjustment: {0}")]
    UnknownAdjustment(String),
    #[error("color match needs a reference image")]
    ReferenceMissing,
    #[error("render took {elapsed:?}, over the {budget:?} budget")]
    RenderTimeout { elapsed: Duration, budget: Duration },
}

impl From<EffectError> for SessionError {
    fn from(err: EffectError) -> Self {
        match err {
            EffectError::InvalidParameter(p) => SessionError::InvalidParameter(p.to_string()),
            EffectError::ReferenceMissing => SessionError::ReferenceMissing,
        }
    }
}

impl From<AdjustmentError> for SessionError {
    fn from(err: AdjustmentError) -> Self {
        match err {
            AdjustmentError::Unknown(name) => SessionError::UnknownAdjustment(name),
            other @ (AdjustmentError::InvalidValue { .. }
            | AdjustmentError::OutputTooLarge { .. }) => {
                SessionError::InvalidParameter(other.to_string())
            }
        }
    }
}

/// State of a loaded document.
#[derive(Debug, Clone)]
struct Document {
    original: PixelBuffer,
    working: PixelBuffer,
    adjustments: AdjustmentSet,
}

/// One open document plus its edit state.
///
/// Generic over the codec so tests can substitute an in-memory one.
pub struct ImageSession<C: ImageCodec = RustCodec> {
    codec: C,
    document: Option<Document>,
    reference: Option<PixelBuffer>,
    cache: RenderCache,
    history: History,
}

impl ImageSession<RustCodec> {
    pub fn new() -> Self {
        Self::with_codec(RustCodec::new())
    }
}

impl Default for ImageSession<RustCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ImageCodec> ImageSession<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            document: None,
            reference: None,
            cache: RenderCache::new(),
            history: History::new(DEFAULT_CAPACITY),
        }
    }

    /// Use a different history capacity. Clears any existing history.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = History::new(capacity);
        if let Some(doc) = &self.document {
            self.history.commit(doc.working.clone());
        }
        self
    }

    // =========================================================================
    // Loading and saving
    // =========================================================================

    /// Decode `path` and make it the session's document.
    ///
    /// Resets the working buffer, adjustments (geometry = decoded size) and
    /// history (single initial snapshot). On failure the previous document
    /// is kept.
    pub fn load_image(&mut self, path: &Path) -> Result<(), SessionError> {
        let buffer = self.codec.decode(path).map_err(SessionError::Decode)?;
        log::info!(
            "loaded {} ({}x{})",
            path.display(),
            buffer.width(),
            buffer.height()
        );
        self.load_buffer(buffer);
        Ok(())
    }

    /// Make an already decoded buffer the session's document.
    pub fn load_buffer(&mut self, buffer: PixelBuffer) {
        let (width, height) = buffer.dimensions();
        self.document = Some(Document {
            original: buffer.clone(),
            working: buffer.clone(),
            adjustments: AdjustmentSet::for_size(width, height),
        });
        self.cache.invalidate();
        self.history.clear();
        self.history.commit(buffer);
    }

    /// Encode the full-quality processed output to `path`.
    pub fn save_image(&mut self, path: &Path) -> Result<(), SessionError> {
        let processed = self.processed(false)?;
        self.codec
            .encode(&processed, path)
            .map_err(SessionError::Encode)?;
        log::info!(
            "saved {} ({}x{})",
            path.display(),
            processed.width(),
            processed.height()
        );
        Ok(())
    }

    /// Decode `path` as the color-match reference.
    pub fn load_reference(&mut self, path: &Path) -> Result<(), SessionError> {
        let reference = self.codec.decode(path).map_err(SessionError::Decode)?;
        log::debug!("reference {} loaded", path.display());
        self.reference = Some(reference);
        Ok(())
    }

    pub fn set_reference(&mut self, reference: PixelBuffer) {
        self.reference = Some(reference);
    }

    // =========================================================================
    // Continuous adjustments
    // =========================================================================

    /// Set one adjustment. Always invalidates the cache.
    pub fn set_adjustment(&mut self, adjustment: Adjustment) -> Result<(), SessionError> {
        let doc = self.document.as_mut().ok_or(SessionError::NoImageLoaded)?;
        doc.adjustments.apply(adjustment);
        self.cache.invalidate();
        Ok(())
    }

    /// Set an adjustment by name from its textual value.
    pub fn set_adjustment_named(&mut self, name: &str, value: &str) -> Result<(), SessionError> {
        let adjustment = Adjustment::parse(name, value)?;
        self.set_adjustment(adjustment)
    }

    /// Every tonal knob to zero, geometry back to the working buffer's size.
    pub fn reset_adjustments(&mut self) -> Result<(), SessionError> {
        let doc = self.document.as_mut().ok_or(SessionError::NoImageLoaded)?;
        let (width, height) = doc.working.dimensions();
        doc.adjustments.reset(width, height);
        self.cache.invalidate();
        Ok(())
    }

    // =========================================================================
    // Processed output
    // =========================================================================

    /// Working buffer with the adjustments applied.
    ///
    /// A fast request returns the cached fast render when there is one.
    /// Otherwise the pipeline runs; fast results are cached, full-quality
    /// results clear the cache.
    pub fn processed(&mut self, fast: bool) -> Result<PixelBuffer, SessionError> {
        let doc = self.document.as_ref().ok_or(SessionError::NoImageLoaded)?;
        if fast && let Some(cached) = self.cache.lookup() {
            log::debug!("render cache hit");
            return Ok(cached);
        }
        let out = pipeline::render(&doc.working, &doc.adjustments, fast)?;
        if fast {
            log::debug!("render cache miss, storing fast render");
            self.cache.store(out.clone());
        } else {
            self.cache.invalidate();
        }
        Ok(out)
    }

    // =========================================================================
    // Destructive edits
    // =========================================================================

    /// Apply a destructive effect to the working buffer and commit it.
    ///
    /// Geometry is reset to the new working size; tonal knobs are kept.
    pub fn apply_effect(&mut self, effect: &Effect) -> Result<(), SessionError> {
        let doc = self.document.as_ref().ok_or(SessionError::NoImageLoaded)?;
        let resolved;
        let effect = match effect {
            Effect::ColorMatch(params) if params.reference.is_none() => {
                resolved = Effect::ColorMatch(self.resolve_reference(params)?);
                &resolved
            }
            other => other,
        };
        let out = effects::apply(&doc.working, effect)?;

        let (width, height) = out.dimensions();
        if let Some(doc) = self.document.as_mut() {
            doc.working = out.clone();
            doc.adjustments.reset_geometry(width, height);
        }
        self.cache.invalidate();
        self.history.commit(out);
        log::info!(
            "applied {} (history {}/{})",
            effect.name(),
            self.history.len(),
            self.history.capacity()
        );
        Ok(())
    }

    fn resolve_reference(&self, params: &ColorMatchParams) -> Result<ColorMatchParams, SessionError> {
        let reference = match &params.reference_path {
            Some(path) => self.codec.decode(path).map_err(SessionError::Decode)?,
            None => self.reference.clone().ok_or(SessionError::ReferenceMissing)?,
        };
        Ok(ColorMatchParams::with_reference(reference))
    }

    /// Step back one history snapshot. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        match self.history.undo() {
            Some(snapshot) => {
                doc.working = snapshot;
                self.cache.invalidate();
                log::info!("undo (history cursor {:?})", self.history.cursor());
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn original(&self) -> Option<&PixelBuffer> {
        self.document.as_ref().map(|d| &d.original)
    }

    pub fn working(&self) -> Option<&PixelBuffer> {
        self.document.as_ref().map(|d| &d.working)
    }

    pub fn adjustments(&self) -> Option<&AdjustmentSet> {
        self.document.as_ref().map(|d| &d.adjustments)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cache_stats(&self) -> CacheStats {
        *self.cache.stats()
    }

    pub fn is_cache_fresh(&self) -> bool {
        self.cache.is_fresh()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}
