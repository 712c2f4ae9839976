//! The immutable raster-image value.
//!
//! [`ImageValue`] is the atomic value an expression runtime holds when an
//! evaluation produces an image. It couples a pixel buffer with a color
//! space and opaque metadata, and it is never mutated: every transform
//! returns a new value, so published values can be shared across threads
//! without locking.
//!
//! # Value identity
//!
//! Two image values are equal when their color space, metadata and pixel
//! arrays (storage class, shape and element bits) are identical - there is
//! no tolerance-based comparison. The hash is a pure function of the same
//! three components and is computed once at construction, so values with
//! diverging provenance but identical content hash and compare equal.
//!
//! # Construction
//!
//! Raw-data constructors return `Option`: data that cannot form an image
//! (jagged rows, a channel count other than 1, 3 or 4, or a channel count
//! that does not fit the declared color space) yields `None` - "not an
//! image" - so the caller can leave the originating expression
//! unevaluated instead of failing.
//!
//! # Example
//!
//! ```rust
//! use raster_core::{ColorSpace, ImageValue};
//!
//! let img = ImageValue::from_matrix(
//!     &[vec![0.0, 0.5, 0.2], vec![1.0, 0.1, 0.3]],
//!     ColorSpace::Grayscale,
//! )
//! .unwrap();
//! assert_eq!(img.dimensions(), (3, 2)); // width first
//! assert_eq!(img.channels(), 1);
//! assert_eq!(img.to_string(), "-Image-");
//! ```
//!
//! # Dependencies
//!
//! - [`crate::storage`] - pixel buffers and format casting
//! - [`crate::colorspace`] - the color-space registry and conversion
//!
//! # Used By
//!
//! - `raster-ops` - every transform consumes and produces `ImageValue`
//! - the host evaluator - equality, hashing, attribute queries

use crate::colorspace::{convert_pixels, ColorSpace};
use crate::storage::{PixelBuffer, Pixels, StorageType};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Opaque string-keyed metadata (EXIF-derived fields and the like).
///
/// Carried through transforms untouched; participates in value identity.
pub type Metadata = BTreeMap<String, String>;

/// Color layout tag handed to the codec layer for re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModeTag {
    /// Three interleaved byte channels.
    Rgb,
    /// Four interleaved byte channels, alpha last.
    Rgba,
}

/// Byte-level rendition of an image for the codec layer.
///
/// Produced by [`ImageValue::encodable_form`]; the pixel bytes are always
/// RGB or RGBA regardless of the canonical color space, and very small
/// images are magnified for visibility. This is a display encoding only,
/// never the stored value.
#[derive(Debug, Clone)]
pub struct EncodedForm {
    /// Interleaved byte samples.
    pub bytes: Vec<u8>,
    /// Encoded width (after any magnification).
    pub width: usize,
    /// Encoded height (after any magnification).
    pub height: usize,
    /// Channel layout of `bytes`.
    pub mode: ColorModeTag,
}

/// Both encoded dimensions must reach this size before magnification stops.
const MIN_DISPLAY_SIZE: usize = 128;

struct ImageInner {
    pixels: Pixels,
    color_space: ColorSpace,
    metadata: Metadata,
    content_hash: u64,
    encoded: OnceLock<EncodedForm>,
}

/// An immutable raster image with value semantics.
///
/// Cloning is cheap: the pixel buffer is held behind an [`Arc`] and shared
/// between clones. See the [module docs](self) for identity and
/// construction rules.
#[derive(Clone)]
pub struct ImageValue {
    inner: Arc<ImageInner>,
}

impl fmt::Debug for ImageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageValue")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .field("colorspace", &self.color_space().name())
            .field("storage", &self.storage_type().name())
            .finish()
    }
}

impl ImageValue {
    fn build(pixels: Pixels, color_space: ColorSpace, metadata: Metadata) -> Self {
        let content_hash = content_hash(&pixels, color_space, &metadata);
        Self {
            inner: Arc::new(ImageInner {
                pixels,
                color_space,
                metadata,
                content_hash,
                encoded: OnceLock::new(),
            }),
        }
    }

    /// Wraps an already-shaped pixel buffer.
    ///
    /// Returns `None` unless the channel count is the color space's own
    /// (or, for RGB, its own plus a trailing alpha channel) - which also
    /// keeps every image at 1, 3 or 4 channels.
    pub fn from_pixels(pixels: Pixels, color_space: ColorSpace, metadata: Metadata) -> Option<Self> {
        let base = color_space.base_channels();
        let channels = pixels.channels();
        let fits = channels == base || (channels == base + 1 && base == 3);
        if !fits || !matches!(channels, 1 | 3 | 4) {
            return None;
        }
        Some(Self::build(pixels, color_space, metadata))
    }

    /// Builds a single-channel image from a rectangular matrix of floats.
    ///
    /// Returns `None` for jagged rows or a color space that is not
    /// single-channel.
    pub fn from_matrix(rows: &[Vec<f64>], color_space: ColorSpace) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        let pixels = Pixels::from_real(data, height, width, 1)?;
        Self::from_pixels(pixels, color_space, Metadata::new())
    }

    /// Builds a multichannel image from nested `[row][col][channel]` data.
    ///
    /// Returns `None` for jagged input or a channel count outside
    /// `{1, 3, 4}`.
    pub fn from_tensor(rows: &[Vec<Vec<f64>>], color_space: ColorSpace) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let channels = rows.first().and_then(|r| r.first()).map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return None;
        }
        let mut data = Vec::with_capacity(height * width * channels);
        for row in rows {
            if row.len() != width {
                return None;
            }
            for px in row {
                if px.len() != channels {
                    return None;
                }
                data.extend_from_slice(px);
            }
        }
        let pixels = Pixels::from_real(data, height, width, channels)?;
        Self::from_pixels(pixels, color_space, Metadata::new())
    }

    /// Codec boundary: wraps decoded pixels, inferring the color space
    /// from the channel count (three or more channels are presumed RGB,
    /// anything else Grayscale).
    pub fn from_decoded(pixels: Pixels, metadata: Metadata) -> Option<Self> {
        let space = ColorSpace::presumed_for_channels(pixels.channels());
        Self::from_pixels(pixels, space, metadata)
    }

    /// Returns a value with the same pixels and color space but new
    /// metadata. Identity follows the new metadata.
    pub fn with_metadata(&self, metadata: Metadata) -> Self {
        Self::build(self.inner.pixels.clone(), self.inner.color_space, metadata)
    }

    /// The pixel buffer and shape.
    #[inline]
    pub fn pixels(&self) -> &Pixels {
        &self.inner.pixels
    }

    /// Pixel data cast to the requested storage class, shape preserved.
    pub fn pixels_as(&self, storage: StorageType) -> Pixels {
        self.inner.pixels.cast(storage)
    }

    /// The color space tag.
    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        self.inner.color_space
    }

    /// The metadata mapping.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// Channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.inner.pixels.channels()
    }

    /// `(width, height)` - width first; height is the outer storage axis.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.inner.pixels.width(), self.inner.pixels.height())
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.inner.pixels.width()
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.inner.pixels.height()
    }

    /// Returns `true` if the image has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.pixels.is_empty()
    }

    /// Storage class, derived purely from the buffer's element type.
    #[inline]
    pub fn storage_type(&self) -> StorageType {
        self.inner.pixels.storage_type()
    }

    /// Converts to another color space.
    ///
    /// Returns a shared clone when the target space and alpha layout
    /// already match (identity fast path). Returns `None` when the pair
    /// has no conversion route; callers propagate that as their own
    /// failure.
    pub fn color_convert(&self, to: ColorSpace, preserve_alpha: bool) -> Option<ImageValue> {
        let base = self.color_space().base_channels();
        let has_alpha = self.channels() == base + 1;
        if to == self.color_space() && (preserve_alpha || !has_alpha) {
            return Some(self.clone());
        }
        let converted = convert_pixels(&self.inner.pixels, self.color_space(), to, preserve_alpha)?;
        Self::from_pixels(converted, to, self.inner.metadata.clone())
    }

    /// Luminance-style reduction to a single-channel Grayscale image.
    ///
    /// Defined for every registered color space, hence infallible.
    pub fn grayscale(&self) -> ImageValue {
        match self.color_convert(ColorSpace::Grayscale, true) {
            Some(img) => img,
            None => unreachable!("Grayscale conversion is defined for every registered space"),
        }
    }

    /// Byte-level RGB/RGBA rendition for the codec layer, memoized.
    ///
    /// Recomputed from the canonical pixels on first use; the cache is
    /// derived state, never authoritative. When both dimensions are below
    /// the minimum visible size the encoding is magnified by
    /// nearest-neighbor - the canonical value is untouched.
    pub fn encodable_form(&self) -> &EncodedForm {
        self.inner.encoded.get_or_init(|| self.compute_encoded())
    }

    fn compute_encoded(&self) -> EncodedForm {
        let rgb = match self.color_convert(ColorSpace::Rgb, true) {
            Some(img) => img,
            None => unreachable!("RGB conversion is defined for every registered space"),
        };
        let bytes_px = rgb.pixels().cast(StorageType::Byte);
        let (height, width, channels) = bytes_px.shape();
        let bytes = match bytes_px.buffer() {
            PixelBuffer::Byte(d) => d.clone(),
            _ => unreachable!("cast to Byte produced a non-byte buffer"),
        };
        let mode = match channels {
            3 => ColorModeTag::Rgb,
            4 => ColorModeTag::Rgba,
            _ => unreachable!("channel count violates the image invariant"),
        };
        if width > 0 && height > 0 && width < MIN_DISPLAY_SIZE && height < MIN_DISPLAY_SIZE {
            let scale = MIN_DISPLAY_SIZE as f64 / width.max(height) as f64;
            let (bytes, width, height) = magnify_nearest(&bytes, width, height, channels, scale);
            return EncodedForm {
                bytes,
                width,
                height,
                mode,
            };
        }
        EncodedForm {
            bytes,
            width,
            height,
            mode,
        }
    }
}

impl PartialEq for ImageValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.color_space == other.inner.color_space
            && self.inner.metadata == other.inner.metadata
            && self.inner.pixels == other.inner.pixels
    }
}

impl Eq for ImageValue {}

impl Hash for ImageValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.content_hash);
    }
}

impl fmt::Display for ImageValue {
    /// The opaque placeholder the evaluator prints for an image atom.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("-Image-")
    }
}

fn content_hash(pixels: &Pixels, color_space: ColorSpace, metadata: &Metadata) -> u64 {
    let mut state = DefaultHasher::new();
    color_space.hash(&mut state);
    metadata.hash(&mut state);
    pixels.feed_hasher(&mut state);
    state.finish()
}

/// Nearest-neighbor magnification of interleaved byte samples.
fn magnify_nearest(
    bytes: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    scale: f64,
) -> (Vec<u8>, usize, usize) {
    let out_w = (scale * width as f64) as usize;
    let out_h = (scale * height as f64) as usize;
    let mut out = Vec::with_capacity(out_w * out_h * channels);
    for oy in 0..out_h {
        let sy = ((oy as f64 / scale) as usize).min(height - 1);
        for ox in 0..out_w {
            let sx = ((ox as f64 / scale) as usize).min(width - 1);
            let base = (sy * width + sx) * channels;
            out.extend_from_slice(&bytes[base..base + channels]);
        }
    }
    (out, out_w, out_h)
}
