//! Color-space registry and pairwise pixel conversion.
//!
//! A color space names the interpretation of a pixel's channel values; it
//! is tracked at runtime as a tag on the image value, not in the type
//! system, because images arrive from decoders and user data with spaces
//! known only at evaluation time.
//!
//! # Registry
//!
//! - [`ColorSpace::Grayscale`] - single luminance channel
//! - [`ColorSpace::Rgb`] - red, green, blue (optionally + alpha)
//! - [`ColorSpace::Cmyk`] - cyan, magenta, yellow, black
//! - [`ColorSpace::Hsb`] - hue, saturation, brightness, hue normalized to `[0, 1]`
//! - [`ColorSpace::Lab`] - CIE L*a*b*, stored divided by 100
//! - [`ColorSpace::Xyz`] - CIE XYZ, D65 white
//!
//! # Conversion
//!
//! [`convert_pixels`] converts through a normalized-float intermediate and
//! routes every pair through the RGB hub. Unsupported pairs yield `None`;
//! callers propagate that as their own failure instead of aborting the
//! pipeline. Conversion to Grayscale is defined for every registered
//! space.
//!
//! # Used By
//!
//! - [`crate::image::ImageValue::color_convert`]
//! - `raster-ops` pseudocolor and threshold operations via `grayscale()`

use crate::storage::{Pixels, StorageType};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Rec.709 luma weights used for the luminance-style Grayscale reduction.
pub const REC709_LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

// D65 reference white, shared by the XYZ matrices and the LAB transform.
const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

/// Named interpretation of a pixel's channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// Single luminance channel.
    Grayscale,
    /// Red, green, blue.
    Rgb,
    /// Cyan, magenta, yellow, black.
    Cmyk,
    /// Hue, saturation, brightness.
    Hsb,
    /// CIE L*a*b* (values stored divided by 100).
    Lab,
    /// CIE XYZ with D65 white point.
    Xyz,
}

impl ColorSpace {
    /// Every registered color space.
    pub const ALL: [ColorSpace; 6] = [
        ColorSpace::Grayscale,
        ColorSpace::Rgb,
        ColorSpace::Cmyk,
        ColorSpace::Hsb,
        ColorSpace::Lab,
        ColorSpace::Xyz,
    ];

    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            ColorSpace::Grayscale => "Grayscale",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Cmyk => "CMYK",
            ColorSpace::Hsb => "HSB",
            ColorSpace::Lab => "LAB",
            ColorSpace::Xyz => "XYZ",
        }
    }

    /// Channel count of the space itself, alpha excluded.
    pub const fn base_channels(self) -> usize {
        match self {
            ColorSpace::Grayscale => 1,
            ColorSpace::Cmyk => 4,
            ColorSpace::Rgb | ColorSpace::Hsb | ColorSpace::Lab | ColorSpace::Xyz => 3,
        }
    }

    /// Color space presumed for decoded pixel data: three or more channels
    /// are presumed RGB, anything else Grayscale.
    pub const fn presumed_for_channels(channels: usize) -> ColorSpace {
        if channels >= 3 {
            ColorSpace::Rgb
        } else {
            ColorSpace::Grayscale
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Grayscale" => Ok(ColorSpace::Grayscale),
            "RGB" => Ok(ColorSpace::Rgb),
            "CMYK" => Ok(ColorSpace::Cmyk),
            "HSB" => Ok(ColorSpace::Hsb),
            "LAB" => Ok(ColorSpace::Lab),
            "XYZ" => Ok(ColorSpace::Xyz),
            other => Err(Error::UnknownColorSpace(other.to_string())),
        }
    }
}

/// Converts pixel data between two registered color spaces.
///
/// Pixels are cast to the normalized-float representation first and the
/// output stays float. A trailing alpha channel (channel count = base + 1)
/// is stripped before conversion when `preserve_alpha` is `false`;
/// otherwise it is carried through untouched and re-attached after the
/// color channels are converted. Alpha survives only when the target
/// space leaves room for it under the 1/3/4-channel image invariant, so
/// conversion to Grayscale or CMYK always drops it.
///
/// Returns `None` when the source channel count fits neither the bare
/// space nor space-plus-alpha, or when no conversion route exists for the
/// pair. Every currently registered pair routes through RGB.
pub fn convert_pixels(
    pixels: &Pixels,
    from: ColorSpace,
    to: ColorSpace,
    preserve_alpha: bool,
) -> Option<Pixels> {
    let base = from.base_channels();
    let channels = pixels.channels();
    let has_alpha = channels == base + 1;
    if channels != base && !has_alpha {
        return None;
    }
    if from == to && (preserve_alpha || !has_alpha) {
        return Some(pixels.cast(StorageType::Real));
    }

    let keep_alpha = has_alpha && preserve_alpha && to.base_channels() == 3;
    let out_channels = to.base_channels() + usize::from(keep_alpha);

    let real = pixels.to_real_vec();
    let mut out = Vec::with_capacity(pixels.height() * pixels.width() * out_channels);
    for px in real.chunks_exact(channels) {
        let rgb = to_rgb(from, &px[..base]);
        push_from_rgb(to, rgb, &mut out);
        if keep_alpha {
            out.push(px[base]);
        }
    }
    Pixels::from_real(out, pixels.height(), pixels.width(), out_channels)
}

/// Rec.709 luminance of an RGB triple.
#[inline]
pub fn luminance(rgb: [f64; 3]) -> f64 {
    rgb[0] * REC709_LUMA[0] + rgb[1] * REC709_LUMA[1] + rgb[2] * REC709_LUMA[2]
}

fn to_rgb(space: ColorSpace, px: &[f64]) -> [f64; 3] {
    match space {
        ColorSpace::Grayscale => [px[0], px[0], px[0]],
        ColorSpace::Rgb => [px[0], px[1], px[2]],
        ColorSpace::Cmyk => cmyk_to_rgb(px[0], px[1], px[2], px[3]),
        ColorSpace::Hsb => hsb_to_rgb(px[0], px[1], px[2]),
        ColorSpace::Lab => xyz_to_rgb(lab_to_xyz(px[0], px[1], px[2])),
        ColorSpace::Xyz => xyz_to_rgb([px[0], px[1], px[2]]),
    }
}

fn push_from_rgb(space: ColorSpace, rgb: [f64; 3], out: &mut Vec<f64>) {
    match space {
        ColorSpace::Grayscale => out.push(luminance(rgb)),
        ColorSpace::Rgb => out.extend_from_slice(&rgb),
        ColorSpace::Cmyk => out.extend_from_slice(&rgb_to_cmyk(rgb)),
        ColorSpace::Hsb => out.extend_from_slice(&rgb_to_hsb(rgb)),
        ColorSpace::Lab => out.extend_from_slice(&xyz_to_lab(rgb_to_xyz(rgb))),
        ColorSpace::Xyz => out.extend_from_slice(&rgb_to_xyz(rgb)),
    }
}

// ============================================================================
// HSB
// ============================================================================

/// Hue is kept in [0, 1] rather than degrees so that HSB pixels share the
/// normalized float domain.
fn rgb_to_hsb([r, g, b]: [f64; 3]) -> [f64; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    let d = max - min;
    let s = if max.abs() < 1e-12 { 0.0 } else { d / max };
    if d.abs() < 1e-12 {
        return [0.0, s, v];
    }
    let h = if (max - r).abs() < 1e-12 {
        let mut h = (g - b) / d;
        if h < 0.0 {
            h += 6.0;
        }
        h / 6.0
    } else if (max - g).abs() < 1e-12 {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };
    [h, s, v]
}

fn hsb_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    if s.abs() < 1e-12 {
        return [v, v, v];
    }
    let h6 = h * 6.0;
    let i = h6.floor() as i64;
    let f = h6 - i as f64;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i.rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

// ============================================================================
// CMYK
// ============================================================================

fn rgb_to_cmyk([r, g, b]: [f64; 3]) -> [f64; 4] {
    let k = 1.0 - r.max(g).max(b);
    if (1.0 - k).abs() < 1e-12 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let c = (1.0 - r - k) / (1.0 - k);
    let m = (1.0 - g - k) / (1.0 - k);
    let y = (1.0 - b - k) / (1.0 - k);
    [c, m, y, k]
}

fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> [f64; 3] {
    [
        (1.0 - c) * (1.0 - k),
        (1.0 - m) * (1.0 - k),
        (1.0 - y) * (1.0 - k),
    ]
}

// ============================================================================
// XYZ / LAB
// ============================================================================

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn rgb_to_xyz([r, g, b]: [f64; 3]) -> [f64; 3] {
    let rl = srgb_to_linear(r);
    let gl = srgb_to_linear(g);
    let bl = srgb_to_linear(b);
    [
        rl * 0.4124564 + gl * 0.3575761 + bl * 0.1804375,
        rl * 0.2126729 + gl * 0.7151522 + bl * 0.0721750,
        rl * 0.0193339 + gl * 0.1191920 + bl * 0.9503041,
    ]
}

fn xyz_to_rgb([x, y, z]: [f64; 3]) -> [f64; 3] {
    let rl = x * 3.2404542 + y * -1.5371385 + z * -0.4985314;
    let gl = x * -0.9692660 + y * 1.8760108 + z * 0.0415560;
    let bl = x * 0.0556434 + y * -0.2040259 + z * 1.0572252;
    [
        linear_to_srgb(rl.clamp(0.0, 1.0)),
        linear_to_srgb(gl.clamp(0.0, 1.0)),
        linear_to_srgb(bl.clamp(0.0, 1.0)),
    ]
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    let t3 = t * t * t;
    if t3 > 0.008856 {
        t3
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// L*, a*, b* divided by 100 so LAB pixels stay near the unit domain.
fn xyz_to_lab([x, y, z]: [f64; 3]) -> [f64; 3] {
    let fx = lab_f(x / D65_WHITE[0]);
    let fy = lab_f(y / D65_WHITE[1]);
    let fz = lab_f(z / D65_WHITE[2]);
    let l = (116.0 * fy - 16.0).max(0.0);
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);
    [l / 100.0, a / 100.0, b / 100.0]
}

fn lab_to_xyz(l: f64, a: f64, b: f64) -> [f64; 3] {
    let l = l * 100.0;
    let a = a * 100.0;
    let b = b * 100.0;
    let fy = (l + 16.0) / 116.0;
    let fx = a / 500.0 + fy;
    let fz = fy - b / 200.0;
    [
        lab_f_inv(fx) * D65_WHITE[0],
        lab_f_inv(fy) * D65_WHITE[1],
        lab_f_inv(fz) * D65_WHITE[2],
    ]
}
