//! Eight-way reflection by side interchange.
//!
//! A reflection spec names two image sides to interchange. The pair is
//! unordered - `(A, B)` and `(B, A)` produce identical results - and the
//! ten distinct pairs map onto four pixel operations: vertical flip,
//! horizontal flip, transpose, anti-transpose, or a no-op for the four
//! degenerate self-pairs.

use crate::error::{OpsError, OpsResult};
use crate::rebuild;
use raster_core::{ImageValue, Pixels};
use tracing::trace;

/// One side of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The top edge.
    Top,
    /// The bottom edge.
    Bottom,
    /// The left edge.
    Left,
    /// The right edge.
    Right,
}

impl Side {
    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            Side::Top => "Top",
            Side::Bottom => "Bottom",
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }

    /// Resolves a side name; `None` for anything outside the four sides.
    pub fn from_name(name: &str) -> Option<Side> {
        match name {
            "Top" => Some(Side::Top),
            "Bottom" => Some(Side::Bottom),
            "Left" => Some(Side::Left),
            "Right" => Some(Side::Right),
            _ => None,
        }
    }
}

enum FlipOp {
    Vertical,
    Horizontal,
    Transpose,
    AntiTranspose,
    Identity,
}

/// The fixed ten-pair table, order-independent.
fn flip_for(a: Side, b: Side) -> FlipOp {
    use Side::*;
    match (a, b) {
        (Top, Top) | (Bottom, Bottom) | (Left, Left) | (Right, Right) => FlipOp::Identity,
        (Top, Bottom) | (Bottom, Top) => FlipOp::Vertical,
        (Left, Right) | (Right, Left) => FlipOp::Horizontal,
        (Left, Top) | (Top, Left) | (Bottom, Right) | (Right, Bottom) => FlipOp::Transpose,
        (Right, Top) | (Top, Right) | (Bottom, Left) | (Left, Bottom) => FlipOp::AntiTranspose,
    }
}

fn reversed(n: usize) -> Vec<usize> {
    (0..n).rev().collect()
}

fn forward(n: usize) -> Vec<usize> {
    (0..n).collect()
}

fn flip_vertical(px: &Pixels) -> Pixels {
    px.select(&reversed(px.height()), &forward(px.width()))
}

fn flip_horizontal(px: &Pixels) -> Pixels {
    px.select(&forward(px.height()), &reversed(px.width()))
}

/// flip ∘ transpose ∘ flip, folded into a transpose plus a reversal of
/// both axes.
fn anti_transpose(px: &Pixels) -> Pixels {
    let t = px.transpose();
    t.select(&reversed(t.height()), &reversed(t.width()))
}

/// Reflects the image so that side `a` is interchanged with side `b`.
///
/// Total for any pair of sides; the pair is order-independent.
pub fn reflect(image: &ImageValue, a: Side, b: Side) -> ImageValue {
    trace!(a = a.name(), b = b.name(), "reflect");
    let px = image.pixels();
    let out = match flip_for(a, b) {
        FlipOp::Identity => return image.clone(),
        FlipOp::Vertical => flip_vertical(px),
        FlipOp::Horizontal => flip_horizontal(px),
        FlipOp::Transpose => px.transpose(),
        FlipOp::AntiTranspose => anti_transpose(px),
    };
    rebuild(image, out)
}

/// Reflects top-to-bottom, the default reflection.
pub fn reflect_vertical(image: &ImageValue) -> ImageValue {
    reflect(image, Side::Top, Side::Bottom)
}

/// Parses two side names and reflects; unknown names produce the invalid
/// reflection-specification error, quoting the offending pair.
pub fn reflect_spec(image: &ImageValue, orig: &str, dest: &str) -> OpsResult<ImageValue> {
    match (Side::from_name(orig), Side::from_name(dest)) {
        (Some(a), Some(b)) => Ok(reflect(image, a, b)),
        _ => Err(OpsError::InvalidReflectionSpec(format!("{orig} -> {dest}"))),
    }
}
