//! # raster-core
//!
//! Core types for immutable raster-image values.
//!
//! This crate provides the value type an expression runtime embeds when an
//! evaluation produces an image, together with its intrinsic behavior:
//!
//! - [`ImageValue`] - immutable image with value identity (equality, hashing)
//! - [`ColorSpace`] - runtime color-space registry and pairwise conversion
//! - [`StorageType`], [`PixelBuffer`], [`Pixels`] - tagged pixel storage and
//!   total format casting
//! - [`EncodedForm`] - the byte-level rendition handed to codec collaborators
//!
//! ## Design Philosophy
//!
//! Everything is a value. An `ImageValue` is never mutated after
//! construction; transforms return new values and clones share the pixel
//! buffer, so images can be passed around an evaluator (and across
//! threads) freely. Color space and storage class are runtime tags rather
//! than type parameters because images arrive from decoders and user data
//! with both known only at evaluation time.
//!
//! Raw data that cannot form an image is reported by `Option::None` from
//! the constructors - not an error and never a panic - so the caller can
//! fall back to leaving its expression unevaluated. The same applies to
//! color-space pairs with no conversion route.
//!
//! ## Crate Structure
//!
//! `raster-core` has no internal dependencies; the transform crate builds
//! on it:
//!
//! ```text
//! raster-core (this crate)
//!    ^
//!    |
//!    +-- raster-ops (geometry, convolution, arithmetic, linearization)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serialization for the tag enums

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorspace;
pub mod error;
pub mod image;
pub mod storage;

pub use colorspace::{convert_pixels, luminance, ColorSpace, REC709_LUMA};
pub use error::{Error, Result};
pub use image::{ColorModeTag, EncodedForm, ImageValue, Metadata};
pub use storage::{PixelBuffer, Pixels, StorageType};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use raster_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorspace::{convert_pixels, luminance, ColorSpace, REC709_LUMA};
    pub use crate::error::{Error, Result};
    pub use crate::image::{ColorModeTag, EncodedForm, ImageValue, Metadata};
    pub use crate::storage::{PixelBuffer, Pixels, StorageType};
}
