//! Fast-preview render cache.
//!
//! Re-rendering the full adjustment pipeline on every viewport frame is
//! wasteful while the user is only panning or zooming: the adjustments
//! haven't changed, so the processed buffer hasn't either. This module keeps
//! the last fast-mode render around until something invalidates it.
//!
//! # Design
//!
//! The cache holds at most one buffer and is a two-state machine:
//!
//! ```text
//!            store(buffer)
//!   Dirty ─────────────────► Fresh(buffer)
//!     ▲                          │
//!     └──────── invalidate ──────┘
//! ```
//!
//! Only fast-mode renders are ever stored. A full-quality render is
//! expensive but rare (committed frames, saves), and it is never served to
//! a fast request because it may have used a different resampling filter.
//! Full renders therefore invalidate instead of storing.
//!
//! The session invalidates on every adjustment change, effect, undo, reset,
//! and load. A fresh entry is never stale: it always reflects the current
//! working buffer and adjustments.

use crate::buffer::PixelBuffer;
use std::fmt;

/// Cache state.
#[derive(Debug, Clone, Default)]
pub enum CacheState {
    #[default]
    Dirty,
    Fresh(PixelBuffer),
}

/// Single-entry cache for fast-mode pipeline output.
#[derive(Debug, Default)]
pub struct RenderCache {
    state: CacheState,
    stats: CacheStats,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached fast render, recording a hit or a miss.
    pub fn lookup(&mut self) -> Option<PixelBuffer> {
        match &self.state {
            CacheState::Fresh(buffer) => {
                self.stats.hit();
                Some(buffer.clone())
            }
            CacheState::Dirty => {
                self.stats.miss();
                None
            }
        }
    }

    /// Store a fast render.
    pub fn store(&mut self, buffer: PixelBuffer) {
        self.state = CacheState::Fresh(buffer);
    }

    /// Drop the cached render, if any.
    pub fn invalidate(&mut self) {
        self.state = CacheState::Dirty;
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.state, CacheState::Fresh(_))
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Summary of cache performance over a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}
