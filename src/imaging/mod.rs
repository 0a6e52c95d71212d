//! Image processing: pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image::ImageReader`, `RgbImage::save_with_format` |
//! | **Resize** | `imageops::resize` (Triangle for previews, Lanczos3 for output) |
//! | **Crop / pad** | `imageops::crop_imm` + `imageops::replace` |
//! | **Gaussian blur** | `imageops::blur` |
//! | **Noise** | `rand` + `rand_distr::Normal` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop/grid math (unit testable)
//! - **Parameters**: Validated effect parameters
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: Geometry helpers combining calculations + `image`
//! - **Tonal**: The twelve per-pixel adjustment steps
//! - **Effects**: The destructive effects catalog

pub mod backend;
mod calculations;
pub mod effects;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod tonal;

pub use backend::{CodecError, ImageCodec};
pub use calculations::{CropPlan, plan_crop};
pub use effects::{Effect, EffectError};
pub use operations::Resampling;
pub use params::{
    BlockSize, BlurKind, Intensity, NoiseKind, OilRadius, ParamError, PosterizeLevels, Radius,
};
pub use rust_backend::RustCodec;
