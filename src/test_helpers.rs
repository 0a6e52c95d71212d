//! Shared test utilities for the retouch test suite.
//!
//! Provides synthetic pixel fixtures, on-disk image fixtures, and a
//! ready-loaded session so unit tests don't each rebuild the same setup.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient(64, 48);
//! let tmp = write_fixture("photo.png", &img);
//! let session = loaded_session(&tmp.path().join("photo.png"));
//! assert_eq!(session.working().unwrap().dimensions(), (64, 48));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::buffer::PixelBuffer;
use crate::session::ImageSession;

// =========================================================================
// Synthetic buffers
// =========================================================================

/// Uniform colour buffer.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> PixelBuffer {
    PixelBuffer::solid(width, height, rgb).unwrap()
}

/// Red ramps left to right, green top to bottom, blue is a constant 128.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    let span_x = width.saturating_sub(1).max(1);
    let span_y = height.saturating_sub(1).max(1);
    PixelBuffer::from_fn(width, height, |x, y| {
        [
            (x * 255 / span_x) as u8,
            (y * 255 / span_y) as u8,
            128,
        ]
    })
    .unwrap()
}

/// Alternating single-pixel checkerboard; `a` sits where `x + y` is even.
pub fn checkerboard(width: u32, height: u32, a: [u8; 3], b: [u8; 3]) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| if (x + y) % 2 == 0 { a } else { b }).unwrap()
}

// =========================================================================
// On-disk fixtures
// =========================================================================

/// Write `buffer` as `name` (format from the extension) in a fresh temp dir.
pub fn write_fixture(name: &str, buffer: &PixelBuffer) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_into(tmp.path(), name, buffer);
    tmp
}

/// Write `buffer` as `name` inside an existing directory.
pub fn write_into(dir: &Path, name: &str, buffer: &PixelBuffer) {
    buffer.as_image().save(dir.join(name)).unwrap();
}

// =========================================================================
// Sessions
// =========================================================================

/// A session with `path` already loaded. Panics with the path on failure.
pub fn loaded_session(path: &Path) -> ImageSession {
    let mut session = ImageSession::new();
    session
        .load_image(path)
        .unwrap_or_else(|e| panic!("failed to load fixture {}: {e}", path.display()));
    session
}

/// A session holding `buffer` directly, without touching disk.
pub fn session_with(buffer: PixelBuffer) -> ImageSession {
    let mut session = ImageSession::new();
    session.load_buffer(buffer);
    session
}
