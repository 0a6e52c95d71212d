//! The twelve tonal steps of the adjustment pipeline.
//!
//! Every step works on floating-point copies of the samples and clamps back
//! to `[0, 255]` before the next step reads the result. A value of `0` is
//! the identity for every step; the pipeline skips zero-valued steps
//! entirely, so nothing here needs a fast path for it.
//!
//! | Step | Per-sample formula (`v` = knob value) |
//! |---|---|
//! | brightness | `s · (1+v)` |
//! | contrast | `m + (s − m) · (1+v)`, `m` = mean luma of the image |
//! | saturation | `l + (s − l) · (1+v)`, `l` = luma of the pixel |
//! | exposure | `s · (1+v)` |
//! | shadows | `s · (1+v)` where `s < 128` |
//! | highlights | `s · (1+v)` where `s > 128` |
//! | blacks, whites | `s + 50·v` |
//! | hue | hue angle `+ 180·v` (mod 360°) in HSV |
//! | temperature | `v>0`: B·(1+v), R·(1−v/2); `v<0`: R·(1−v), B·(1+v/2) |
//! | white_balance | B·(1+v), R·(1−v) for either sign |
//! | warmth | `v>0`: B·(1+v), G·(1+v/2); `v<0`: R·(1−v), G·(1−v/2) |
//!
//! Shadows and highlights scale by the same factor whatever the sign, while
//! the three colour-balance steps branch on it. Both behaviours are kept
//! as they are.
//!
//! The three enhancement steps (brightness, contrast, saturation) round to
//! nearest; the remaining steps truncate toward zero after clamping.

use crate::adjustments::Knob;
use crate::buffer::PixelBuffer;

/// Integer ITU-R 601 luma: `(r·19595 + g·38470 + b·7471 + 2^15) >> 16`.
///
/// Pure red `(255, 0, 0)` maps to `76`.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16) as u8
}

#[derive(Clone, Copy)]
enum Quantize {
    Round,
    Truncate,
}

impl Quantize {
    fn apply(self, v: f32) -> u8 {
        let v = v.clamp(0.0, 255.0);
        match self {
            Quantize::Round => v.round() as u8,
            Quantize::Truncate => v as u8,
        }
    }
}

fn per_pixel<F>(buffer: &PixelBuffer, quantize: Quantize, f: F) -> PixelBuffer
where
    F: Fn([f32; 3], [u8; 3]) -> [f32; 3],
{
    buffer.map_pixels(|px| {
        let out = f(px.map(f32::from), px);
        out.map(|v| quantize.apply(v))
    })
}

/// Apply a single tonal step.
pub fn apply(buffer: &PixelBuffer, knob: Knob, value: f32) -> PixelBuffer {
    match knob {
        Knob::Brightness => brightness(buffer, value),
        Knob::Contrast => contrast(buffer, value),
        Knob::Saturation => saturation(buffer, value),
        Knob::Exposure => exposure(buffer, value),
        Knob::Shadows => shadows(buffer, value),
        Knob::Highlights => highlights(buffer, value),
        Knob::Blacks | Knob::Whites => offset(buffer, value),
        Knob::Hue => hue(buffer, value),
        Knob::Temperature => temperature(buffer, value),
        Knob::WhiteBalance => white_balance(buffer, value),
        Knob::Warmth => warmth(buffer, value),
    }
}

pub fn brightness(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    per_pixel(buffer, Quantize::Round, |s, _| s.map(|c| c * factor))
}

pub fn contrast(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    let total: u64 = buffer
        .as_image()
        .pixels()
        .map(|p| u64::from(luma(p.0)))
        .sum();
    let mean = (total as f64 / buffer.pixel_count() as f64 + 0.5).floor() as f32;
    per_pixel(buffer, Quantize::Round, |s, _| {
        s.map(|c| mean + (c - mean) * factor)
    })
}

pub fn saturation(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    per_pixel(buffer, Quantize::Round, |s, raw| {
        let gray = f32::from(luma(raw));
        s.map(|c| gray + (c - gray) * factor)
    })
}

pub fn exposure(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    per_pixel(buffer, Quantize::Truncate, |s, _| s.map(|c| c * factor))
}

pub fn shadows(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    per_pixel(buffer, Quantize::Truncate, |s, _| {
        s.map(|c| if c < 128.0 { c * factor } else { c })
    })
}

pub fn highlights(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let factor = 1.0 + value;
    per_pixel(buffer, Quantize::Truncate, |s, _| {
        s.map(|c| if c > 128.0 { c * factor } else { c })
    })
}

/// Shared by `blacks` and `whites`: both shift every sample by `50·v`.
pub fn offset(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let shift = value * 50.0;
    per_pixel(buffer, Quantize::Truncate, |s, _| s.map(|c| c + shift))
}

pub fn hue(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    let shift = value * 180.0;
    per_pixel(buffer, Quantize::Round, |s, _| {
        let (h, sat, v) = rgb_to_hsv(s);
        hsv_to_rgb((h + shift).rem_euclid(360.0), sat, v)
    })
}

pub fn temperature(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    per_pixel(buffer, Quantize::Truncate, |[r, g, b], _| {
        if value > 0.0 {
            [r * (1.0 - value * 0.5), g, b * (1.0 + value)]
        } else {
            [r * (1.0 - value), g, b * (1.0 + value * 0.5)]
        }
    })
}

pub fn white_balance(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    per_pixel(buffer, Quantize::Truncate, |[r, g, b], _| {
        [r * (1.0 - value), g, b * (1.0 + value)]
    })
}

pub fn warmth(buffer: &PixelBuffer, value: f32) -> PixelBuffer {
    per_pixel(buffer, Quantize::Truncate, |[r, g, b], _| {
        if value > 0.0 {
            [r, g * (1.0 + value * 0.5), b * (1.0 + value)]
        } else {
            [r * (1.0 - value), g * (1.0 - value * 0.5), b]
        }
    })
}

/// RGB (0–255) to hue in degrees, saturation and value in `[0, 1]`.
fn rgb_to_hsv([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
    let (r, g, b) = (r / 255.0, g / 255.0, b / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [(r + m) * 255.0, (g + m) * 255.0, (b + m) * 255.0]
}
