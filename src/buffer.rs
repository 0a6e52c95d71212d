//! Immutable RGB8 raster shared between the session, history and viewport.
//!
//! A [`PixelBuffer`] is produced once (by decoding, or by a transform) and
//! never mutated afterwards. Cloning is cheap: clones share the underlying
//! allocation, which is what lets the history stack hold snapshots of the
//! working buffer without copying pixels. Every transform in the crate
//! allocates a fresh buffer, so a snapshot can never observe a later edit.
//!
//! Samples are row-major, three channels per pixel, eight bits per channel.

use image::{Rgb, RgbImage};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("pixel buffer must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes for a {width}x{height} RGB buffer, got {actual}")]
    Length {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Decoded raster image, width × height × 3 channels of `u8`.
#[derive(Clone)]
pub struct PixelBuffer {
    image: Arc<RgbImage>,
}

impl PixelBuffer {
    /// Wrap a decoded image. Fails for zero-sized images.
    pub fn from_image(image: RgbImage) -> Result<Self, BufferError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(BufferError::Empty { width, height });
        }
        Ok(Self::wrap(image))
    }

    /// Build a buffer from interleaved RGB bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        match RgbImage::from_raw(width, height, data) {
            Some(image) if actual == expected => Ok(Self::wrap(image)),
            _ => Err(BufferError::Length {
                width,
                height,
                expected,
                actual,
            }),
        }
    }

    /// A buffer filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, BufferError> {
        Self::from_image(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    /// A buffer whose pixels are produced by `f(x, y)`.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self, BufferError>
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        Self::from_image(RgbImage::from_fn(width, height, |x, y| Rgb(f(x, y))))
    }

    /// Internal constructor for transforms whose output size is already
    /// known to be non-zero (derived from an existing buffer or a validated
    /// target size).
    pub(crate) fn wrap(image: RgbImage) -> Self {
        debug_assert!(image.width() > 0 && image.height() > 0);
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels (width × height).
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Borrow the underlying `image` buffer for read-only processing.
    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// Interleaved RGB samples.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Owned copy of the pixels, for transforms that build on the source.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::clone(&self.image)
    }

    /// True when both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    /// Apply `f` to every pixel, producing a new buffer of the same size.
    pub fn map_pixels<F>(&self, mut f: F) -> Self
    where
        F: FnMut([u8; 3]) -> [u8; 3],
    {
        let mut out = self.to_image();
        for px in out.pixels_mut() {
            px.0 = f(px.0);
        }
        Self::wrap(out)
    }
}

impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.dimensions() == other.dimensions() && self.as_raw() == other.as_raw())
    }
}

impl Eq for PixelBuffer {}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}
