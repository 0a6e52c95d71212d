//! Destructive effects catalog.
//!
//! Every effect is a pure function `(PixelBuffer, params) -> PixelBuffer`.
//! The catalog is a closed enum, [`Effect`], with one typed parameter struct
//! per variant; [`apply`] dispatches over it with an exhaustive match.
//!
//! Effects fall into two families:
//!
//! - **Blend-with-intensity**: compute `transformed = f(image)` and return
//!   `image·(1−t) + transformed·t`. `t = 0` returns the input exactly,
//!   `t = 1` the raw transform exactly. Members: glow, invert, emboss,
//!   grayscale, sepia, sharpen, details, smoothing, noise reduction.
//! - **Full-replace**: return the transformed buffer directly. Members:
//!   pixelate, vignette, posterize, blur, oil painting, noise, color match.
//!
//! | Effect | Transform |
//! |---|---|
//! | glow | `image + gaussian(image, radius)` |
//! | invert | `255 − s` |
//! | emboss | 3×3 emboss kernel, offset 128 |
//! | grayscale | integer 601 luma on all channels |
//! | sepia | classic sepia matrix |
//! | sharpen | 3×3 sharpen kernel (centre 32, ring −2, ÷16) |
//! | details | unsharp mask, σ 2, amount `150·t` %, threshold 3 |
//! | smoothing | gaussian, σ `5·t` |
//! | noise reduction | median, window `3 + ⌊4t⌋` rounded up to odd |
//! | pixelate | nearest downsample by block, nearest upsample |
//! | vignette | `s · clamp(1 − d/d_max · t, 0, 1)` |
//! | posterize | median-cut palette of 2–8 colours |
//! | blur | gaussian or box, by radius |
//! | oil painting | interior pixels blended with their square-neighbourhood mean |
//! | noise | gaussian `N(0, 255·level)` or salt-and-pepper |
//! | color match | per-channel mean/std transfer from a reference |

use super::calculations::{median_window, pixelation_grid};
use super::operations::{Resampling, resample};
use super::params::{
    BlockSize, BlurKind, Intensity, NoiseKind, OilRadius, ParamError, PosterizeLevels, Radius,
};
use super::tonal::luma;
use crate::buffer::PixelBuffer;
use image::{Rgb, RgbImage, imageops};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),
    #[error("color match needs a reference image")]
    ReferenceMissing,
}

/// Parameters for effects driven only by a blend amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntensityParams {
    #[serde(default)]
    pub intensity: Intensity,
}

impl IntensityParams {
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity: Intensity::new(intensity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlowParams {
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub radius: Radius,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PixelateParams {
    pub block_size: BlockSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PosterizeParams {
    #[serde(default)]
    pub levels: PosterizeLevels,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlurParams {
    #[serde(default)]
    pub radius: Radius,
    #[serde(default)]
    pub method: BlurKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OilPaintingParams {
    #[serde(default)]
    pub radius: OilRadius,
    #[serde(default)]
    pub intensity: Intensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseParams {
    #[serde(default)]
    pub level: Intensity,
    #[serde(default)]
    pub method: NoiseKind,
    /// Fixed RNG seed; a fresh random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Reference for color matching.
///
/// `reference` holds the decoded image. Recipes name a file instead
/// (`reference_path`), which the session decodes before applying.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorMatchParams {
    #[serde(skip)]
    pub reference: Option<PixelBuffer>,
    #[serde(default, rename = "reference")]
    pub reference_path: Option<PathBuf>,
}

impl ColorMatchParams {
    pub fn with_reference(reference: PixelBuffer) -> Self {
        Self {
            reference: Some(reference),
            reference_path: None,
        }
    }
}

/// Which blending family an effect belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    BlendWithIntensity,
    FullReplace,
}

/// A destructive effect with its parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Glow(GlowParams),
    Invert(IntensityParams),
    Emboss(IntensityParams),
    Grayscale(IntensityParams),
    Sepia(IntensityParams),
    Sharpen(IntensityParams),
    Details(IntensityParams),
    Smoothing(IntensityParams),
    NoiseReduction(IntensityParams),
    Pixelate(PixelateParams),
    Vignette(IntensityParams),
    Posterize(PosterizeParams),
    Blur(BlurParams),
    OilPainting(OilPaintingParams),
    Noise(NoiseParams),
    ColorMatch(ColorMatchParams),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Glow(_) => "glow",
            Effect::Invert(_) => "invert",
            Effect::Emboss(_) => "emboss",
            Effect::Grayscale(_) => "grayscale",
            Effect::Sepia(_) => "sepia",
            Effect::Sharpen(_) => "sharpen",
            Effect::Details(_) => "details",
            Effect::Smoothing(_) => "smoothing",
            Effect::NoiseReduction(_) => "noise_reduction",
            Effect::Pixelate(_) => "pixelate",
            Effect::Vignette(_) => "vignette",
            Effect::Posterize(_) => "posterize",
            Effect::Blur(_) => "blur",
            Effect::OilPainting(_) => "oil_painting",
            Effect::Noise(_) => "noise",
            Effect::ColorMatch(_) => "color_match",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Effect::Glow(_)
            | Effect::Invert(_)
            | Effect::Emboss(_)
            | Effect::Grayscale(_)
            | Effect::Sepia(_)
            | Effect::Sharpen(_)
            | Effect::Details(_)
            | Effect::Smoothing(_)
            | Effect::NoiseReduction(_) => Family::BlendWithIntensity,
            Effect::Pixelate(_)
            | Effect::Vignette(_)
            | Effect::Posterize(_)
            | Effect::Blur(_)
            | Effect::OilPainting(_)
            | Effect::Noise(_)
            | Effect::ColorMatch(_) => Family::FullReplace,
        }
    }
}

/// Apply an effect, producing a new buffer.
pub fn apply(image: &PixelBuffer, effect: &Effect) -> Result<PixelBuffer, EffectError> {
    let out = match effect {
        Effect::Glow(p) => blended(image, p.intensity, |img| glow(img, p.radius)),
        Effect::Invert(p) => blended(image, p.intensity, invert),
        Effect::Emboss(p) => blended(image, p.intensity, emboss),
        Effect::Grayscale(p) => blended(image, p.intensity, grayscale),
        Effect::Sepia(p) => blended(image, p.intensity, sepia),
        Effect::Sharpen(p) => blended(image, p.intensity, sharpen),
        Effect::Details(p) => blended(image, p.intensity, |img| {
            unsharp_mask(img, 2.0, 150.0 * p.intensity.value(), 3)
        }),
        Effect::Smoothing(p) => blended(image, p.intensity, |img| {
            gaussian_blur(img, 5.0 * p.intensity.value())
        }),
        Effect::NoiseReduction(p) => blended(image, p.intensity, |img| {
            median_filter(img, median_window(p.intensity.value()))
        }),
        Effect::Pixelate(p) => pixelate(image, p.block_size),
        Effect::Vignette(p) => vignette(image, p.intensity),
        Effect::Posterize(p) => posterize(image, p.levels),
        Effect::Blur(p) => match p.method {
            BlurKind::Gaussian => gaussian_blur(image, p.radius.value()),
            BlurKind::Box => box_blur(image, p.radius.value().round() as u32),
        },
        Effect::OilPainting(p) => oil_painting(image, p.radius, p.intensity),
        Effect::Noise(p) => noise(image, p)?,
        Effect::ColorMatch(p) => {
            let reference = p.reference.as_ref().ok_or(EffectError::ReferenceMissing)?;
            color_match(image, reference)
        }
    };
    Ok(out)
}

// =============================================================================
// Blending
// =============================================================================

fn round_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

fn blended<F>(image: &PixelBuffer, intensity: Intensity, transform: F) -> PixelBuffer
where
    F: FnOnce(&PixelBuffer) -> PixelBuffer,
{
    let t = intensity.value();
    if t == 0.0 {
        return image.clone();
    }
    let transformed = transform(image);
    if t == 1.0 {
        return transformed;
    }
    blend(image, &transformed, t)
}

/// `a·(1−t) + b·t` per sample, rounded and clamped.
pub fn blend(a: &PixelBuffer, b: &PixelBuffer, t: f32) -> PixelBuffer {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let data = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| round_u8(f32::from(x) * (1.0 - t) + f32::from(y) * t))
        .collect();
    let (w, h) = a.dimensions();
    PixelBuffer::wrap(RgbImage::from_raw(w, h, data).unwrap_or_else(|| RgbImage::new(w, h)))
}

// =============================================================================
// Kernels
// =============================================================================

fn convolve3(image: &PixelBuffer, kernel: [f32; 9], scale: f32, offset: f32) -> PixelBuffer {
    let src = image.as_image();
    let (w, h) = src.dimensions();
    let max_x = i64::from(w) - 1;
    let max_y = i64::from(h) - 1;
    let out = RgbImage::from_fn(w, h, |x, y| {
        let mut acc = [0f32; 3];
        for (i, k) in kernel.iter().enumerate() {
            if *k == 0.0 {
                continue;
            }
            let sx = (i64::from(x) + (i % 3) as i64 - 1).clamp(0, max_x) as u32;
            let sy = (i64::from(y) + (i / 3) as i64 - 1).clamp(0, max_y) as u32;
            let p = src.get_pixel(sx, sy);
            for c in 0..3 {
                acc[c] += f32::from(p[c]) * k;
            }
        }
        Rgb(acc.map(|v| round_u8(v / scale + offset)))
    });
    PixelBuffer::wrap(out)
}

fn invert(image: &PixelBuffer) -> PixelBuffer {
    image.map_pixels(|px| px.map(|c| 255 - c))
}

fn emboss(image: &PixelBuffer) -> PixelBuffer {
    convolve3(
        image,
        [-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        1.0,
        128.0,
    )
}

fn sharpen(image: &PixelBuffer) -> PixelBuffer {
    convolve3(
        image,
        [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0],
        16.0,
        0.0,
    )
}

fn grayscale(image: &PixelBuffer) -> PixelBuffer {
    image.map_pixels(|px| {
        let l = luma(px);
        [l, l, l]
    })
}

fn sepia(image: &PixelBuffer) -> PixelBuffer {
    const M: [[f32; 3]; 3] = [
        [0.393, 0.769, 0.189],
        [0.349, 0.686, 0.168],
        [0.272, 0.534, 0.131],
    ];
    image.map_pixels(|px| {
        let [r, g, b] = px.map(f32::from);
        M.map(|row| (row[0] * r + row[1] * g + row[2] * b).clamp(0.0, 255.0) as u8)
    })
}

fn glow(image: &PixelBuffer, radius: Radius) -> PixelBuffer {
    let blurred = gaussian_blur(image, radius.value());
    let data = image
        .as_raw()
        .iter()
        .zip(blurred.as_raw())
        .map(|(&a, &b)| a.saturating_add(b))
        .collect();
    let (w, h) = image.dimensions();
    PixelBuffer::wrap(RgbImage::from_raw(w, h, data).unwrap_or_else(|| RgbImage::new(w, h)))
}

// =============================================================================
// Blurs and filters
// =============================================================================

/// Gaussian blur with standard deviation `sigma`. `sigma <= 0` is a no-op.
pub fn gaussian_blur(image: &PixelBuffer, sigma: f32) -> PixelBuffer {
    if sigma <= 0.0 {
        return image.clone();
    }
    PixelBuffer::wrap(imageops::blur(image.as_image(), sigma))
}

/// Separable box blur over a `(2r+1)²` window with clamped edges.
pub fn box_blur(image: &PixelBuffer, radius: u32) -> PixelBuffer {
    if radius == 0 {
        return image.clone();
    }
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    let samples: Vec<f32> = image.as_raw().iter().map(|&v| f32::from(v)).collect();
    let horizontal = box_pass(&samples, w, h, radius as usize, true);
    let vertical = box_pass(&horizontal, w, h, radius as usize, false);
    let data = vertical.into_iter().map(round_u8).collect();
    PixelBuffer::wrap(
        RgbImage::from_raw(w as u32, h as u32, data)
            .unwrap_or_else(|| RgbImage::new(w as u32, h as u32)),
    )
}

fn box_pass(src: &[f32], w: usize, h: usize, r: usize, horizontal: bool) -> Vec<f32> {
    let mut out = vec![0f32; src.len()];
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let index = |line: usize, pos: usize, c: usize| {
        if horizontal {
            (line * w + pos) * 3 + c
        } else {
            (pos * w + line) * 3 + c
        }
    };
    let window = (2 * r + 1) as f32;
    let last = len - 1;
    for line in 0..lines {
        for c in 0..3 {
            let mut sum: f32 = (0..=2 * r)
                .map(|i| src[index(line, i.saturating_sub(r).min(last), c)])
                .sum();
            for pos in 0..len {
                out[index(line, pos, c)] = sum / window;
                let add = (pos + r + 1).min(last);
                let sub = pos.saturating_sub(r);
                sum += src[index(line, add, c)] - src[index(line, sub, c)];
            }
        }
    }
    out
}

/// Per-channel median over a `window × window` neighbourhood.
pub fn median_filter(image: &PixelBuffer, window: u32) -> PixelBuffer {
    let src = image.as_image();
    let (w, h) = src.dimensions();
    let r = i64::from(window / 2);
    let mut values: Vec<u8> = Vec::with_capacity((window * window) as usize);
    let out = RgbImage::from_fn(w, h, |x, y| {
        let mut px = [0u8; 3];
        for (c, slot) in px.iter_mut().enumerate() {
            values.clear();
            for dy in -r..=r {
                let sy = (i64::from(y) + dy).clamp(0, i64::from(h) - 1) as u32;
                for dx in -r..=r {
                    let sx = (i64::from(x) + dx).clamp(0, i64::from(w) - 1) as u32;
                    values.push(src.get_pixel(sx, sy)[c]);
                }
            }
            let mid = values.len() / 2;
            *slot = *values.select_nth_unstable(mid).1;
        }
        Rgb(px)
    });
    PixelBuffer::wrap(out)
}

/// Unsharp mask: samples whose difference from the blurred image is at
/// least `threshold` are pushed away from it by `percent` of that difference.
pub fn unsharp_mask(image: &PixelBuffer, sigma: f32, percent: f32, threshold: u8) -> PixelBuffer {
    let blurred = gaussian_blur(image, sigma);
    let amount = percent / 100.0;
    let data = image
        .as_raw()
        .iter()
        .zip(blurred.as_raw())
        .map(|(&s, &b)| {
            let diff = i16::from(s) - i16::from(b);
            if diff.unsigned_abs() >= u16::from(threshold) {
                round_u8(f32::from(s) + f32::from(diff) * amount)
            } else {
                s
            }
        })
        .collect();
    let (w, h) = image.dimensions();
    PixelBuffer::wrap(RgbImage::from_raw(w, h, data).unwrap_or_else(|| RgbImage::new(w, h)))
}

// =============================================================================
// Full-replace effects
// =============================================================================

fn pixelate(image: &PixelBuffer, block: BlockSize) -> PixelBuffer {
    let (w, h) = image.dimensions();
    let (gw, gh) = pixelation_grid((w, h), block.value());
    let small = resample(image, gw, gh, Resampling::Nearest);
    resample(&small, w, h, Resampling::Nearest)
}

fn vignette(image: &PixelBuffer, intensity: Intensity) -> PixelBuffer {
    let t = f64::from(intensity.value());
    let (w, h) = image.dimensions();
    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let max_distance = (cx * cx + cy * cy).sqrt();
    let src = image.as_image();
    let out = RgbImage::from_fn(w, h, |x, y| {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        let distance = (dx * dx + dy * dy).sqrt();
        let factor = (1.0 - distance / max_distance * t).clamp(0.0, 1.0);
        Rgb(src.get_pixel(x, y).0.map(|c| (f64::from(c) * factor) as u8))
    });
    PixelBuffer::wrap(out)
}

fn posterize(image: &PixelBuffer, levels: PosterizeLevels) -> PixelBuffer {
    let palette = median_cut_palette(image, levels.value() as usize);
    let mut nearest: HashMap<[u8; 3], [u8; 3]> = HashMap::new();
    image.map_pixels(|px| {
        *nearest.entry(px).or_insert_with(|| {
            palette
                .iter()
                .copied()
                .min_by_key(|p| distance_sq(*p, px))
                .unwrap_or(px)
        })
    })
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b)
        .map(|(&x, y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

/// Adaptive palette by median cut: repeatedly split the box with the widest
/// channel range at its median until `colors` boxes exist or no box can be
/// split. Each box contributes its mean colour.
fn median_cut_palette(image: &PixelBuffer, colors: usize) -> Vec<[u8; 3]> {
    let pixels: Vec<[u8; 3]> = image.as_image().pixels().map(|p| p.0).collect();
    let mut boxes = vec![pixels];

    while boxes.len() < colors {
        let widest = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.len() > 1)
            .map(|(i, b)| {
                let (channel, range) = widest_channel(b);
                (i, channel, range)
            })
            .max_by_key(|&(i, _, range)| (range, std::cmp::Reverse(i)));
        let Some((index, channel, range)) = widest else {
            break;
        };
        if range == 0 {
            break;
        }
        let mut cell = boxes.remove(index);
        cell.sort_unstable_by_key(|p| p[channel]);
        let upper = cell.split_off(cell.len() / 2);
        boxes.push(cell);
        boxes.push(upper);
    }

    boxes.iter().map(|b| mean_color(b)).collect()
}

fn widest_channel(pixels: &[[u8; 3]]) -> (usize, u8) {
    (0..3)
        .map(|c| {
            let (lo, hi) = pixels
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[c]), hi.max(p[c])));
            (c, hi - lo)
        })
        .max_by_key(|&(c, range)| (range, std::cmp::Reverse(c)))
        .unwrap_or((0, 0))
}

fn mean_color(pixels: &[[u8; 3]]) -> [u8; 3] {
    let n = pixels.len().max(1) as u64;
    let mut sum = [0u64; 3];
    for p in pixels {
        for c in 0..3 {
            sum[c] += u64::from(p[c]);
        }
    }
    sum.map(|s| ((s + n / 2) / n) as u8)
}

/// Oil painting: each interior pixel (at least `radius` from every edge) is
/// blended with the truncated mean of its `(2r+1)²` neighbourhood, read from
/// the unmodified source. Border pixels are left as they are.
///
/// Neighbourhood sums come from a summed-area table, so the cost is
/// independent of the radius.
fn oil_painting(image: &PixelBuffer, radius: OilRadius, intensity: Intensity) -> PixelBuffer {
    let r = radius.value() as usize;
    let t = intensity.value();
    let (w, h) = image.dimensions();
    let (w, h) = (w as usize, h as usize);
    if w <= 2 * r || h <= 2 * r {
        return image.clone();
    }

    let raw = image.as_raw();
    let stride = w + 1;
    let mut table = vec![[0u64; 3]; stride * (h + 1)];
    for y in 0..h {
        let mut row = [0u64; 3];
        for x in 0..w {
            for c in 0..3 {
                row[c] += u64::from(raw[(y * w + x) * 3 + c]);
                table[(y + 1) * stride + x + 1][c] = table[y * stride + x + 1][c] + row[c];
            }
        }
    }

    let count = ((2 * r + 1) * (2 * r + 1)) as u64;
    let mut out = raw.to_vec();
    for y in r..h - r {
        for x in r..w - r {
            let (x0, y0, x1, y1) = (x - r, y - r, x + r + 1, y + r + 1);
            for c in 0..3 {
                let sum = table[y1 * stride + x1][c] + table[y0 * stride + x0][c]
                    - table[y0 * stride + x1][c]
                    - table[y1 * stride + x0][c];
                let mean = (sum / count) as f32;
                let i = (y * w + x) * 3 + c;
                out[i] = (f32::from(raw[i]) * (1.0 - t) + mean * t).clamp(0.0, 255.0) as u8;
            }
        }
    }
    PixelBuffer::wrap(
        RgbImage::from_raw(w as u32, h as u32, out)
            .unwrap_or_else(|| RgbImage::new(w as u32, h as u32)),
    )
}

fn noise(image: &PixelBuffer, params: &NoiseParams) -> Result<PixelBuffer, EffectError> {
    let level = params.level.value();
    if level == 0.0 {
        return Ok(image.clone());
    }
    let mut rng = StdRng::seed_from_u64(params.seed.unwrap_or_else(rand::random));
    let out = match params.method {
        NoiseKind::Gaussian => {
            let sigma = level * 255.0;
            let dist = Normal::new(0.0f32, sigma).map_err(|_| ParamError::OutOfRange {
                name: "level",
                value: f64::from(level),
                min: 0.0,
                max: 1.0,
            })?;
            image.map_pixels(|px| px.map(|c| round_u8(f32::from(c) + dist.sample(&mut rng))))
        }
        NoiseKind::SaltPepper => {
            let half = f64::from(level) / 2.0;
            image.map_pixels(|px| {
                let roll: f64 = rng.random();
                if roll < half {
                    [0; 3]
                } else if roll > 1.0 - half {
                    [255; 3]
                } else {
                    px
                }
            })
        }
    };
    Ok(out)
}

/// Population mean and standard deviation per channel.
fn channel_stats(image: &PixelBuffer) -> ([f64; 3], [f64; 3]) {
    let n = image.pixel_count() as f64;
    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    for p in image.as_image().pixels() {
        for c in 0..3 {
            let v = f64::from(p[c]);
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }
    let mean = sum.map(|s| s / n);
    let mut std = [0f64; 3];
    for c in 0..3 {
        std[c] = (sum_sq[c] / n - mean[c] * mean[c]).max(0.0).sqrt();
    }
    (mean, std)
}

/// Transfer the reference's per-channel mean and spread onto `image`.
///
/// A channel with zero spread in the source is left unchanged.
pub fn color_match(image: &PixelBuffer, reference: &PixelBuffer) -> PixelBuffer {
    let (src_mean, src_std) = channel_stats(image);
    let (ref_mean, ref_std) = channel_stats(reference);
    image.map_pixels(|px| {
        let mut out = px;
        for c in 0..3 {
            if src_std[c] != 0.0 {
                let v = (f64::from(px[c]) - src_mean[c]) * (ref_std[c] / src_std[c]) + ref_mean[c];
                out[c] = v.clamp(0.0, 255.0) as u8;
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, gradient, solid};

    fn blend_family() -> Vec<fn(f32) -> Effect> {
        vec![
            |t| {
                Effect::Glow(GlowParams {
                    intensity: Intensity::new(t),
                    radius: Radius::new(1.5).unwrap(),
                })
            },
            |t| Effect::Invert(IntensityParams::new(t)),
            |t| Effect::Emboss(IntensityParams::new(t)),
            |t| Effect::Grayscale(IntensityParams::new(t)),
            |t| Effect::Sepia(IntensityParams::new(t)),
            |t| Effect::Sharpen(IntensityParams::new(t)),
            |t| Effect::Details(IntensityParams::new(t)),
            |t| Effect::Smoothing(IntensityParams::new(t)),
            |t| Effect::NoiseReduction(IntensityParams::new(t)),
        ]
    }

    // =========================================================================
    // Blend family boundaries
    // =========================================================================

    #[test]
    fn blend_family_intensity_zero_is_identity() {
        let img = gradient(24, 16);
        for make in blend_family() {
            let effect = make(0.0);
            assert_eq!(effect.family(), Family::BlendWithIntensity);
            let out = apply(&img, &effect).unwrap();
            assert_eq!(out, img, "{} at t=0", effect.name());
        }
    }

    #[test]
    fn blend_family_intensity_one_is_raw_transform() {
        let img = gradient(24, 16);
        let raw: Vec<PixelBuffer> = vec![
            glow(&img, Radius::new(1.5).unwrap()),
            invert(&img),
            emboss(&img),
            grayscale(&img),
            sepia(&img),
            sharpen(&img),
            unsharp_mask(&img, 2.0, 150.0, 3),
            gaussian_blur(&img, 5.0),
            median_filter(&img, 7),
        ];
        for (make, expected) in blend_family().into_iter().zip(raw) {
            let effect = make(1.0);
            let out = apply(&img, &effect).unwrap();
            assert_eq!(out, expected, "{} at t=1", effect.name());
        }
    }

    #[test]
    fn invert_half_blends_to_mid_gray() {
        let img = solid(2, 2, [0, 100, 255]);
        let out = apply(&img, &Effect::Invert(IntensityParams::new(0.5))).unwrap();
        assert_eq!(out.pixel(0, 0), [128, 128, 128]);
    }

    #[test]
    fn grayscale_of_pure_red() {
        let img = solid(100, 100, [255, 0, 0]);
        let out = apply(&img, &Effect::Grayscale(IntensityParams::new(1.0))).unwrap();
        assert!(out.as_image().pixels().all(|p| p.0 == [76, 76, 76]));
    }

    #[test]
    fn emboss_of_flat_image_is_offset_gray() {
        let img = solid(5, 5, [40, 90, 200]);
        let out = emboss(&img);
        assert!(out.as_image().pixels().all(|p| p.0 == [128, 128, 128]));
    }

    #[test]
    fn sharpen_of_flat_image_is_identity() {
        let img = solid(5, 5, [40, 90, 200]);
        assert_eq!(sharpen(&img), img);
    }

    #[test]
    fn sepia_of_white_saturates() {
        let img = solid(1, 1, [255, 255, 255]);
        assert_eq!(sepia(&img).pixel(0, 0), [255, 255, 238]);
    }

    // =========================================================================
    // Full-replace effects
    // =========================================================================

    #[test]
    fn vignette_zero_intensity_is_identity() {
        let img = gradient(31, 17);
        let out = apply(&img, &Effect::Vignette(IntensityParams::new(0.0))).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn vignette_darkens_corners_not_center() {
        let img = solid(21, 21, [200, 200, 200]);
        let out = apply(&img, &Effect::Vignette(IntensityParams::new(1.0))).unwrap();
        assert!(out.pixel(0, 0)[0] < 20);
        assert!(out.pixel(10, 10)[0] >= 190);
    }

    #[test]
    fn pixelate_produces_uniform_blocks() {
        let img = gradient(40, 40);
        let out = apply(
            &img,
            &Effect::Pixelate(PixelateParams {
                block_size: BlockSize::new(10).unwrap(),
            }),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (40, 40));
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(out.pixel(x, y), out.pixel(0, 0));
            }
        }
        assert_ne!(out.pixel(0, 0), out.pixel(39, 39));
    }

    #[test]
    fn pixelate_block_one_is_identity() {
        let img = gradient(12, 9);
        let out = pixelate(&img, BlockSize::new(1).unwrap());
        assert_eq!(out, img);
    }

    #[test]
    fn posterize_limits_palette() {
        let img = gradient(32, 32);
        for levels in [2, 5, 8] {
            let out = posterize(&img, PosterizeLevels::new(levels));
            let mut colors: Vec<[u8; 3]> = out.as_image().pixels().map(|p| p.0).collect();
            colors.sort_unstable();
            colors.dedup();
            assert!(colors.len() <= levels as usize, "{} colors", colors.len());
            assert!(colors.len() >= 2);
        }
    }

    #[test]
    fn posterize_two_tone_image_is_unchanged() {
        let img = checkerboard(8, 8, [10, 20, 30], [200, 210, 220]);
        assert_eq!(posterize(&img, PosterizeLevels::new(2)), img);
    }

    #[test]
    fn blur_zero_radius_is_identity() {
        let img = gradient(10, 10);
        for method in [BlurKind::Gaussian, BlurKind::Box] {
            let out = apply(
                &img,
                &Effect::Blur(BlurParams {
                    radius: Radius::new(0.0).unwrap(),
                    method,
                }),
            )
            .unwrap();
            assert_eq!(out, img);
        }
    }

    #[test]
    fn box_blur_of_flat_image_is_identity() {
        let img = solid(9, 7, [10, 128, 250]);
        assert_eq!(box_blur(&img, 3), img);
    }

    #[test]
    fn box_blur_averages_neighbours() {
        // Single bright column in the middle of a 3x1 strip
        let img = PixelBuffer::from_fn(3, 1, |x, _| if x == 1 { [90; 3] } else { [0; 3] })
            .unwrap();
        let out = box_blur(&img, 1);
        assert_eq!(out.pixel(1, 0), [30, 30, 30]);
        // Clamped edge: window is [0, 0, 90]
        assert_eq!(out.pixel(0, 0), [30, 30, 30]);
    }

    #[test]
    fn oil_painting_leaves_border_untouched() {
        let img = gradient(12, 12);
        let out = oil_painting(&img, OilRadius::new(2).unwrap(), Intensity::FULL);
        for i in 0..12 {
            assert_eq!(out.pixel(i, 0), img.pixel(i, 0));
            assert_eq!(out.pixel(0, i), img.pixel(0, i));
            assert_eq!(out.pixel(i, 11), img.pixel(i, 11));
            assert_eq!(out.pixel(11, i), img.pixel(11, i));
        }
    }

    #[test]
    fn oil_painting_matches_naive_neighbourhood_mean() {
        let img = checkerboard(9, 9, [255, 255, 255], [0, 0, 0]);
        let out = oil_painting(&img, OilRadius::new(1).unwrap(), Intensity::FULL);
        // Centre (4,4) is white; its 3x3 window holds 5 white pixels
        let expected = (5 * 255 / 9) as u8;
        assert_eq!(out.pixel(4, 4), [expected; 3]);
    }

    #[test]
    fn oil_painting_image_smaller_than_window_is_unchanged() {
        let img = gradient(4, 4);
        assert_eq!(
            oil_painting(&img, OilRadius::new(2).unwrap(), Intensity::FULL),
            img
        );
    }

    #[test]
    fn noise_is_deterministic_with_seed() {
        let img = solid(16, 16, [128, 128, 128]);
        let effect = Effect::Noise(NoiseParams {
            level: Intensity::new(0.2),
            method: NoiseKind::Gaussian,
            seed: Some(7),
        });
        let a = apply(&img, &effect).unwrap();
        let b = apply(&img, &effect).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, img);
    }

    #[test]
    fn salt_pepper_only_writes_extremes() {
        let img = solid(32, 32, [128, 128, 128]);
        let out = apply(
            &img,
            &Effect::Noise(NoiseParams {
                level: Intensity::new(0.5),
                method: NoiseKind::SaltPepper,
                seed: Some(42),
            }),
        )
        .unwrap();
        let mut salt = 0;
        let mut pepper = 0;
        for p in out.as_image().pixels() {
            match p.0 {
                [0, 0, 0] => pepper += 1,
                [255, 255, 255] => salt += 1,
                [128, 128, 128] => {}
                other => panic!("unexpected pixel {other:?}"),
            }
        }
        assert!(salt > 0 && pepper > 0);
    }

    #[test]
    fn noise_level_zero_is_identity() {
        let img = gradient(8, 8);
        let zero = Effect::Noise(NoiseParams {
            level: Intensity::NONE,
            ..NoiseParams::default()
        });
        assert_eq!(apply(&img, &zero).unwrap(), img);
    }

    #[test]
    fn color_match_without_reference_fails() {
        let img = gradient(4, 4);
        assert_eq!(
            apply(&img, &Effect::ColorMatch(ColorMatchParams::default())),
            Err(EffectError::ReferenceMissing)
        );
    }

    #[test]
    fn color_match_transfers_mean() {
        let img = gradient(16, 16);
        let reference = checkerboard(16, 16, [100, 100, 100], [140, 140, 140]);
        let out = color_match(&img, &reference);
        let (mean, _) = channel_stats(&out);
        // Red and green vary across the gradient; blue is flat
        for m in &mean[..2] {
            assert!((m - 120.0).abs() < 1.5, "mean {m}");
        }
    }

    #[test]
    fn color_match_flat_channel_is_left_alone() {
        // Blue is constant in the gradient fixture
        let img = gradient(8, 8);
        let reference = solid(8, 8, [0, 0, 10]);
        let out = color_match(&img, &reference);
        assert_eq!(out.pixel(3, 3)[2], img.pixel(3, 3)[2]);
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[test]
    fn effect_deserializes_from_tagged_table() {
        let effect: Effect = toml::from_str("kind = \"oil_painting\"\nradius = 2").unwrap();
        assert_eq!(
            effect,
            Effect::OilPainting(OilPaintingParams {
                radius: OilRadius::new(2).unwrap(),
                intensity: Intensity::FULL,
            })
        );
        let bad = toml::from_str::<Effect>("kind = \"pixelate\"\nblock_size = 0");
        assert!(bad.is_err());
    }

    #[test]
    fn oversized_blur_radius_is_rejected_on_load() {
        for kind in ["blur", "glow"] {
            let err = toml::from_str::<Effect>(&format!("kind = \"{kind}\"\nradius = 1e30"))
                .unwrap_err();
            assert!(err.to_string().contains("radius must be between 0 and 100"), "{err}");
        }
        assert!(toml::from_str::<Effect>("kind = \"blur\"\nradius = 100.0").is_ok());
    }

    #[test]
    fn color_match_reference_path_deserializes() {
        let effect: Effect = toml::from_str("kind = \"color_match\"\nreference = \"ref.png\"").unwrap();
        let Effect::ColorMatch(params) = effect else {
            panic!("expected color match");
        };
        assert_eq!(params.reference_path, Some(PathBuf::from("ref.png")));
        assert!(params.reference.is_none());
    }
}
