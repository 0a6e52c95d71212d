//! Parameter types for destructive effects.
//!
//! These structs describe *how strongly* to apply an effect, not how the
//! effect works. Each type owns its validation so the effect catalog can
//! trust every value it receives:
//!
//! - [`Intensity`]: blend amount in `[0, 1]`. Clamped on construction.
//! - [`BlockSize`]: pixelation block edge, `1..=50`. Rejected outside.
//! - [`PosterizeLevels`]: palette size, clamped silently to `2..=8`.
//! - [`OilRadius`]: oil-painting neighbourhood radius, `1..=5`. Rejected outside.
//! - [`Radius`]: blur/glow radius, `0..=100`. Rejected outside.
//!
//! All of them deserialize through their validating constructors, so a
//! recipe file cannot smuggle in an out-of-range value.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Blend amount between the original and the transformed image.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "f32")]
pub struct Intensity(f32);

impl Intensity {
    pub const NONE: Intensity = Intensity(0.0);
    pub const FULL: Intensity = Intensity(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::NONE;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<f32> for Intensity {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Pixelation block edge in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub struct BlockSize(u32);

impl BlockSize {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 50;

    pub fn new(value: u32) -> Result<Self, ParamError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ParamError::OutOfRange {
                name: "block_size",
                value: value as f64,
                min: Self::MIN as f64,
                max: Self::MAX as f64,
            })
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for BlockSize {
    type Error = ParamError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Number of colours the posterize palette may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u32")]
pub struct PosterizeLevels(u32);

impl PosterizeLevels {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(2, 8))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for PosterizeLevels {
    fn default() -> Self {
        Self(4)
    }
}

impl From<u32> for PosterizeLevels {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Oil-painting neighbourhood radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub struct OilRadius(u32);

impl OilRadius {
    pub fn new(value: u32) -> Result<Self, ParamError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ParamError::OutOfRange {
                name: "radius",
                value: value as f64,
                min: 1.0,
                max: 5.0,
            })
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for OilRadius {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u32> for OilRadius {
    type Error = ParamError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Blur or glow radius (Gaussian standard deviation, or box half-width).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "f32")]
pub struct Radius(f32);

impl Radius {
    pub const MAX: f32 = 100.0;

    pub fn new(value: f32) -> Result<Self, ParamError> {
        if (0.0..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ParamError::OutOfRange {
                name: "radius",
                value: value as f64,
                min: 0.0,
                max: Self::MAX as f64,
            })
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Radius {
    fn default() -> Self {
        Self(2.0)
    }
}

impl TryFrom<f32> for Radius {
    type Error = ParamError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Blur kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurKind {
    #[default]
    Gaussian,
    Box,
}

/// Noise distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    Gaussian,
    SaltPepper,
}
