//! # raster-ops
//!
//! Pure transforms over immutable raster image values.
//!
//! Every operation consumes one or more [`ImageValue`]s plus a small set
//! of typed parameters and produces a new value; nothing is mutated in
//! place, so operations may run freely in parallel across independent
//! images.
//!
//! # Modules
//!
//! - [`geometry`] - take/crop index normalization, partition, pixel addressing
//! - [`reflect`] - eight-way side reflection and transposition
//! - [`filter`] - kernel construction and edge-clamped convolution
//! - [`arith`] - pixel arithmetic reduction with clipping
//! - [`linearize`] - rank linearization and pseudocoloring
//! - [`threshold`] - threshold estimation and binarization
//! - [`channels`] - channel separation and combination
//! - [`delegate`] - marshaling seam for external morphology backends
//!
//! # Example
//!
//! ```rust
//! use raster_core::{ColorSpace, ImageValue};
//! use raster_ops::{arith, geometry};
//!
//! let img = ImageValue::from_matrix(
//!     &[vec![0.0, 0.5, 0.2], vec![1.0, 0.1, 0.3]],
//!     ColorSpace::Grayscale,
//! )
//! .unwrap();
//!
//! let brighter = arith::arithmetic(
//!     &img,
//!     arith::ArithOp::Add,
//!     &[arith::Operand::Number(0.5)],
//! )
//! .unwrap();
//! let top_row = geometry::take_rows(&brighter, 1);
//! assert_eq!(top_row.dimensions(), (3, 1));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod arith;
pub mod channels;
pub mod delegate;
pub mod filter;
pub mod geometry;
pub mod linearize;
pub mod reflect;
pub mod threshold;

pub use arith::{arithmetic, ArithOp, Operand};
pub use channels::{color_combine, color_separate};
pub use delegate::{morphology, Delegated, DelegatedOp};
pub use error::{OpsError, OpsResult};
pub use filter::{convolve, Kernel};
pub use geometry::{
    image_coords, partition, pixel_value, pixel_value_positions, take, take2, take_rows,
    PixelPosition,
};
pub use linearize::{colorize, colorize_image, linearize};
pub use reflect::{reflect, reflect_spec, reflect_vertical, Side};
pub use threshold::{binarize, binarize_auto, binarize_band, threshold, ThresholdMethod};

use raster_core::{ImageValue, Pixels};

/// Wraps transformed pixels back into a value carrying the source image's
/// color space and metadata.
///
/// Transforms never change the channel count, so the image invariants
/// cannot fail here.
pub(crate) fn rebuild(source: &ImageValue, pixels: Pixels) -> ImageValue {
    match ImageValue::from_pixels(pixels, source.color_space(), source.metadata().clone()) {
        Some(img) => img,
        None => unreachable!("transform preserved a valid channel layout"),
    }
}

/// Shape of a rectangular nested matrix, or `None` when rows are jagged.
pub(crate) fn rect_shape(rows: &[Vec<f64>]) -> Option<(usize, usize)> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != width) {
        return None;
    }
    Some((height, width))
}
