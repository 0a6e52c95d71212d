//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations the editor needs
//! from the outside world, decode and encode. Everything else in
//! the crate works on in-memory [`PixelBuffer`]s.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image`
//! crate's pure Rust decoders and encoders.

use crate::buffer::{BufferError, PixelBuffer};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Trait for image codecs.
///
/// Decoding always yields 8-bit RGB; alpha and palette images are flattened.
/// Encoding picks the output format from the path's extension.
pub trait ImageCodec: Sync {
    /// Decode a file into an RGB buffer.
    fn decode(&self, path: &Path) -> Result<PixelBuffer, CodecError>;

    /// Encode a buffer to `path`, overwriting any existing file.
    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), CodecError>;
}
