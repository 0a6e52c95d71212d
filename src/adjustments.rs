//! Continuous, non-destructive adjustments.
//!
//! An [`AdjustmentSet`] is a parameter map: twelve tonal knobs, each a signed
//! float nominally in `[-1, 1]`, plus the geometry fields that decide the
//! output size. It never touches pixels itself; the
//! [`pipeline`](crate::pipeline) reads it to turn the working buffer into
//! the processed output.
//!
//! Zero is the identity for every knob, and the geometry defaults to the
//! buffer's own size, so a fresh set reproduces its input exactly.
//!
//! Values outside `[-1, 1]` are accepted; the tonal steps clamp their output
//! samples instead of rejecting the input.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjustmentError {
    #[error("unknown adjustment: {0}")]
    Unknown(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
    #[error("output size {width}x{height} exceeds {max} pixels")]
    OutputTooLarge { width: u32, height: u32, max: u64 },
}

/// A tonal knob. Declaration order is the order the pipeline applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    Brightness,
    Contrast,
    Saturation,
    Exposure,
    Shadows,
    Highlights,
    Blacks,
    Whites,
    Hue,
    Temperature,
    WhiteBalance,
    Warmth,
}

impl Knob {
    /// Every knob, in pipeline order. Each step reads the previous step's
    /// output, so reordering changes the result.
    pub const PIPELINE_ORDER: [Knob; 12] = [
        Knob::Brightness,
        Knob::Contrast,
        Knob::Saturation,
        Knob::Exposure,
        Knob::Shadows,
        Knob::Highlights,
        Knob::Blacks,
        Knob::Whites,
        Knob::Hue,
        Knob::Temperature,
        Knob::WhiteBalance,
        Knob::Warmth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Knob::Brightness => "brightness",
            Knob::Contrast => "contrast",
            Knob::Saturation => "saturation",
            Knob::Exposure => "exposure",
            Knob::Shadows => "shadows",
            Knob::Highlights => "highlights",
            Knob::Blacks => "blacks",
            Knob::Whites => "whites",
            Knob::Hue => "hue",
            Knob::Temperature => "temperature",
            Knob::WhiteBalance => "white_balance",
            Knob::Warmth => "warmth",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Knob {
    type Err = AdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Knob::PIPELINE_ORDER
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| AdjustmentError::Unknown(s.to_string()))
    }
}

/// How the target size is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMethod {
    /// Resample the whole buffer to the target size.
    #[default]
    Resize,
    /// Cut (or pad) a window of the target size.
    Crop,
}

impl FromStr for ResizeMethod {
    type Err = AdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resize" => Ok(Self::Resize),
            "crop" => Ok(Self::Crop),
            other => Err(AdjustmentError::InvalidValue {
                name: "resize_method".into(),
                value: other.into(),
            }),
        }
    }
}

impl fmt::Display for ResizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resize => "resize",
            Self::Crop => "crop",
        })
    }
}

/// Anchor of the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropSide {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl FromStr for CropSide {
    type Err = AdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(Self::Center),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(AdjustmentError::InvalidValue {
                name: "crop_side".into(),
                value: other.into(),
            }),
        }
    }
}

impl fmt::Display for CropSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// Output size and how to reach it.
///
/// A zero width or height disables the geometry step entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub method: ResizeMethod,
    pub crop_side: CropSide,
}

impl Geometry {
    /// Largest accepted width or height.
    pub const MAX_SIDE: u32 = 16_384;
    /// Largest output area the geometry step will allocate.
    pub const MAX_PIXELS: u64 = 64 * 1024 * 1024;

    /// Identity geometry for a buffer of the given size.
    pub fn native(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            method: ResizeMethod::Resize,
            crop_side: CropSide::Center,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Reject targets whose output buffer would be unreasonably large.
    pub fn check_size(&self) -> Result<(), AdjustmentError> {
        let pixels = self.width as u64 * self.height as u64;
        if self.width > Self::MAX_SIDE || self.height > Self::MAX_SIDE || pixels > Self::MAX_PIXELS {
            return Err(AdjustmentError::OutputTooLarge {
                width: self.width,
                height: self.height,
                max: Self::MAX_PIXELS,
            });
        }
        Ok(())
    }
}

/// One parsed `name = value` assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Tonal(Knob, f32),
    Width(u32),
    Height(u32),
    ResizeMethod(ResizeMethod),
    CropSide(CropSide),
}

impl Adjustment {
    /// Parse a named adjustment from its textual value.
    ///
    /// Unknown names are rejected. Tonal range is not checked; width and
    /// height must not exceed [`Geometry::MAX_SIDE`].
    pub fn parse(name: &str, value: &str) -> Result<Self, AdjustmentError> {
        let invalid = || AdjustmentError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();
        match name {
            "width" | "height" => {
                let n: f64 = value.parse().map_err(|_| invalid())?;
                if !n.is_finite() || n < 0.0 || n.round() > Geometry::MAX_SIDE as f64 {
                    return Err(invalid());
                }
                let n = n.round() as u32;
                Ok(if name == "width" {
                    Adjustment::Width(n)
                } else {
                    Adjustment::Height(n)
                })
            }
            "resize_method" => value.parse().map(Adjustment::ResizeMethod),
            "crop_side" => value.parse().map(Adjustment::CropSide),
            _ => {
                let knob: Knob = name.parse()?;
                let v: f32 = value.parse().map_err(|_| invalid())?;
                if !v.is_finite() {
                    return Err(invalid());
                }
                Ok(Adjustment::Tonal(knob, v))
            }
        }
    }
}

impl FromStr for Adjustment {
    type Err = AdjustmentError;

    /// Parse `name=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.split_once('=').ok_or_else(|| AdjustmentError::InvalidValue {
            name: s.to_string(),
            value: String::new(),
        })?;
        Adjustment::parse(name.trim(), value)
    }
}

/// Tonal knob values plus geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentSet {
    tonal: [f32; 12],
    geometry: Geometry,
}

impl AdjustmentSet {
    /// Identity adjustments for a buffer of the given size.
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            tonal: [0.0; 12],
            geometry: Geometry::native(width, height),
        }
    }

    pub fn get(&self, knob: Knob) -> f32 {
        self.tonal[knob.index()]
    }

    pub fn set(&mut self, knob: Knob, value: f32) {
        self.tonal[knob.index()] = value;
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn apply(&mut self, adjustment: Adjustment) {
        match adjustment {
            Adjustment::Tonal(knob, value) => self.set(knob, value),
            Adjustment::Width(w) => self.geometry.width = w,
            Adjustment::Height(h) => self.geometry.height = h,
            Adjustment::ResizeMethod(m) => self.geometry.method = m,
            Adjustment::CropSide(s) => self.geometry.crop_side = s,
        }
    }

    /// Knobs with a non-zero value, in pipeline order.
    pub fn active_knobs(&self) -> impl Iterator<Item = (Knob, f32)> + '_ {
        Knob::PIPELINE_ORDER
            .into_iter()
            .map(|k| (k, self.get(k)))
            .filter(|&(_, v)| v != 0.0)
    }

    /// All tonal values back to zero, geometry back to the given native size.
    pub fn reset(&mut self, width: u32, height: u32) {
        *self = Self::for_size(width, height);
    }

    /// Keep tonal values, reset geometry to a new native size.
    pub fn reset_geometry(&mut self, width: u32, height: u32) {
        self.geometry = Geometry::native(width, height);
    }
}
