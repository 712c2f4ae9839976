//! Pixel storage classes and format casting.
//!
//! An image's storage type is determined purely by the element type of its
//! pixel buffer, independent of color space:
//!
//! - [`StorageType::Real`] - `f64`, normalized domain `[0, 1]`
//! - [`StorageType::Byte`] - `u8`, domain `[0, 255]`
//! - [`StorageType::Bit16`] - `u16`, domain `[0, 65535]`
//! - [`StorageType::Bit32`] - `u32`
//! - [`StorageType::Bit`] - `bool`, used for binary masks
//!
//! # Casting rules
//!
//! All casts are total functions: out-of-range inputs are clipped, never
//! rejected.
//!
//! - to `Real`: divide by the maximum representable value of the source
//!   type; `Bit` maps to `{0.0, 1.0}`.
//! - to `Byte`/`Bit16`/`Bit32`: floats are scaled by the target maximum,
//!   rounded and clipped; integer sources are rescaled proportionally.
//! - to `Bit`: truncation to integer, non-zero becomes set. This is NOT a
//!   threshold at 0.5; `0.7` truncates to `0`.
//!
//! # Dependencies
//!
//! - [`crate::error::Error`] - for storage-format name resolution
//!
//! # Used By
//!
//! - [`crate::image::ImageValue`] - pixel buffer and storage queries
//! - `raster-ops` - transforms cast to `Real` before computing

use crate::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Numeric representation of pixel values, independent of color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageType {
    /// 64-bit float, normalized domain `[0, 1]`.
    Real,
    /// Unsigned 8-bit, domain `[0, 255]`.
    Byte,
    /// Unsigned 16-bit, domain `[0, 65535]`.
    Bit16,
    /// Unsigned 32-bit.
    Bit32,
    /// Boolean, for binary masks.
    Bit,
}

impl StorageType {
    /// Canonical name used by data-access operations.
    pub const fn name(self) -> &'static str {
        match self {
            StorageType::Real => "Real",
            StorageType::Byte => "Byte",
            StorageType::Bit16 => "Bit16",
            StorageType::Bit32 => "Bit32",
            StorageType::Bit => "Bit",
        }
    }

    /// Maximum representable value, used for normalization.
    pub const fn max_value(self) -> f64 {
        match self {
            StorageType::Real => 1.0,
            StorageType::Byte => 255.0,
            StorageType::Bit16 => 65535.0,
            StorageType::Bit32 => 4294967295.0,
            StorageType::Bit => 1.0,
        }
    }

    /// Whether this is a floating-point representation.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, StorageType::Real)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Real" => Ok(StorageType::Real),
            "Byte" => Ok(StorageType::Byte),
            "Bit16" => Ok(StorageType::Bit16),
            "Bit32" => Ok(StorageType::Bit32),
            "Bit" => Ok(StorageType::Bit),
            other => Err(Error::UnsupportedPixelFormat(other.to_string())),
        }
    }
}

/// Dense pixel element buffer, tagged by storage class.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    /// Normalized float samples.
    Real(Vec<f64>),
    /// Unsigned byte samples.
    Byte(Vec<u8>),
    /// Unsigned 16-bit samples.
    Bit16(Vec<u16>),
    /// Unsigned 32-bit samples.
    Bit32(Vec<u32>),
    /// Boolean samples.
    Bit(Vec<bool>),
}

impl PixelBuffer {
    /// Storage class of this buffer.
    pub const fn storage_type(&self) -> StorageType {
        match self {
            PixelBuffer::Real(_) => StorageType::Real,
            PixelBuffer::Byte(_) => StorageType::Byte,
            PixelBuffer::Bit16(_) => StorageType::Bit16,
            PixelBuffer::Bit32(_) => StorageType::Bit32,
            PixelBuffer::Bit(_) => StorageType::Bit,
        }
    }

    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::Real(d) => d.len(),
            PixelBuffer::Byte(d) => d.len(),
            PixelBuffer::Bit16(d) => d.len(),
            PixelBuffer::Bit32(d) => d.len(),
            PixelBuffer::Bit(d) => d.len(),
        }
    }

    /// Returns `true` if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized-float rendition of every sample.
    pub fn to_real(&self) -> Vec<f64> {
        match self {
            PixelBuffer::Real(d) => d.clone(),
            PixelBuffer::Byte(d) => d.iter().map(|&v| v as f64 / 255.0).collect(),
            PixelBuffer::Bit16(d) => d.iter().map(|&v| v as f64 / 65535.0).collect(),
            PixelBuffer::Bit32(d) => d.iter().map(|&v| v as f64 / 4294967295.0).collect(),
            PixelBuffer::Bit(d) => d.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect(),
        }
    }

    /// Casts every sample to the target storage class.
    ///
    /// Total: out-of-range values are clipped. See the module docs for the
    /// per-target rules.
    pub fn cast(&self, target: StorageType) -> PixelBuffer {
        if self.storage_type() == target {
            return self.clone();
        }
        match target {
            StorageType::Real => PixelBuffer::Real(self.to_real()),
            StorageType::Byte => {
                PixelBuffer::Byte(self.scaled(255.0).map(|v| v as u8).collect())
            }
            StorageType::Bit16 => {
                PixelBuffer::Bit16(self.scaled(65535.0).map(|v| v as u16).collect())
            }
            StorageType::Bit32 => {
                PixelBuffer::Bit32(self.scaled(4294967295.0).map(|v| v as u32).collect())
            }
            StorageType::Bit => PixelBuffer::Bit(self.truncated_nonzero()),
        }
    }

    /// Samples rescaled proportionally onto `[0, max]` and rounded.
    ///
    /// `as` casts on the caller side saturate, which provides the clipping.
    fn scaled(&self, max: f64) -> impl Iterator<Item = f64> + '_ {
        let src_max = self.storage_type().max_value();
        let factor = max / src_max;
        self.iter_raw().map(move |v| (v * factor).round())
    }

    /// Truncation-to-integer mask: a sample is set iff its integer part is
    /// non-zero.
    fn truncated_nonzero(&self) -> Vec<bool> {
        self.iter_raw().map(|v| v.trunc() != 0.0).collect()
    }

    /// Raw (unnormalized) sample values as `f64`.
    fn iter_raw(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            PixelBuffer::Real(d) => Box::new(d.iter().copied()),
            PixelBuffer::Byte(d) => Box::new(d.iter().map(|&v| v as f64)),
            PixelBuffer::Bit16(d) => Box::new(d.iter().map(|&v| v as f64)),
            PixelBuffer::Bit32(d) => Box::new(d.iter().map(|&v| v as f64)),
            PixelBuffer::Bit(d) => Box::new(d.iter().map(|&v| if v { 1.0 } else { 0.0 })),
        }
    }

    /// Bit-exact sample equality. Floats compare by bit pattern so that
    /// equality stays consistent with hashing.
    fn bit_eq(&self, other: &PixelBuffer) -> bool {
        match (self, other) {
            (PixelBuffer::Real(a), PixelBuffer::Real(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (PixelBuffer::Byte(a), PixelBuffer::Byte(b)) => a == b,
            (PixelBuffer::Bit16(a), PixelBuffer::Bit16(b)) => a == b,
            (PixelBuffer::Bit32(a), PixelBuffer::Bit32(b)) => a == b,
            (PixelBuffer::Bit(a), PixelBuffer::Bit(b)) => a == b,
            _ => false,
        }
    }

    /// Feeds the exact sample bytes (plus the storage discriminant) to a
    /// hasher.
    fn feed_hasher<H: Hasher>(&self, state: &mut H) {
        self.storage_type().hash(state);
        match self {
            PixelBuffer::Real(d) => {
                for v in d {
                    state.write_u64(v.to_bits());
                }
            }
            PixelBuffer::Byte(d) => state.write(d),
            PixelBuffer::Bit16(d) => {
                for v in d {
                    state.write_u16(*v);
                }
            }
            PixelBuffer::Bit32(d) => {
                for v in d {
                    state.write_u32(*v);
                }
            }
            PixelBuffer::Bit(d) => {
                for v in d {
                    state.write_u8(*v as u8);
                }
            }
        }
    }
}

/// A pixel buffer coupled with its `[height][width][channel]` shape.
///
/// The shape is always three-dimensional; constructors that accept
/// two-dimensional data add the channel axis. Row 0 is the top row of the
/// image in storage order.
#[derive(Debug, Clone)]
pub struct Pixels {
    buf: PixelBuffer,
    height: usize,
    width: usize,
    channels: usize,
}

impl Pixels {
    /// Couples a buffer with a shape.
    ///
    /// Returns `None` when the buffer length does not equal
    /// `height * width * channels`.
    pub fn new(buf: PixelBuffer, height: usize, width: usize, channels: usize) -> Option<Self> {
        if buf.len() != height * width * channels {
            return None;
        }
        Some(Self {
            buf,
            height,
            width,
            channels,
        })
    }

    /// Shapes a flat normalized-float vector.
    pub fn from_real(data: Vec<f64>, height: usize, width: usize, channels: usize) -> Option<Self> {
        Self::new(PixelBuffer::Real(data), height, width, channels)
    }

    /// Stacks per-channel float planes (all `height * width` long) into an
    /// interleaved buffer.
    pub fn from_planes(planes: &[Vec<f64>], height: usize, width: usize) -> Option<Self> {
        let channels = planes.len();
        let plane_len = height * width;
        if channels == 0 || planes.iter().any(|p| p.len() != plane_len) {
            return None;
        }
        let mut data = Vec::with_capacity(plane_len * channels);
        for i in 0..plane_len {
            for plane in planes {
                data.push(plane[i]);
            }
        }
        Self::from_real(data, height, width, channels)
    }

    /// Image height (outer axis).
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Image width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Storage class of the underlying buffer.
    #[inline]
    pub fn storage_type(&self) -> StorageType {
        self.buf.storage_type()
    }

    /// The underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buf
    }

    /// Total number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the image has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Casts to the target storage class, shape preserved.
    pub fn cast(&self, target: StorageType) -> Pixels {
        Pixels {
            buf: self.buf.cast(target),
            height: self.height,
            width: self.width,
            channels: self.channels,
        }
    }

    /// All samples in normalized-float form, interleaved.
    pub fn to_real_vec(&self) -> Vec<f64> {
        self.buf.to_real()
    }

    /// One channel plane in normalized-float form.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    pub fn plane(&self, channel: usize) -> Vec<f64> {
        assert!(channel < self.channels, "channel out of range");
        let real = self.buf.to_real();
        real.chunks_exact(self.channels).map(|px| px[channel]).collect()
    }

    /// One channel as a single-channel `Pixels`, storage preserved.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channels()`.
    pub fn channel(&self, channel: usize) -> Pixels {
        assert!(channel < self.channels, "channel out of range");
        let c = self.channels;
        let buf = match &self.buf {
            PixelBuffer::Real(d) => PixelBuffer::Real(take_channel(d, c, channel)),
            PixelBuffer::Byte(d) => PixelBuffer::Byte(take_channel(d, c, channel)),
            PixelBuffer::Bit16(d) => PixelBuffer::Bit16(take_channel(d, c, channel)),
            PixelBuffer::Bit32(d) => PixelBuffer::Bit32(take_channel(d, c, channel)),
            PixelBuffer::Bit(d) => PixelBuffer::Bit(take_channel(d, c, channel)),
        };
        Pixels {
            buf,
            height: self.height,
            width: self.width,
            channels: 1,
        }
    }

    /// Normalized-float values of the pixel at `(row, col)` in storage
    /// coordinates (row 0 = top).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of range.
    pub fn sample(&self, row: usize, col: usize) -> Vec<f64> {
        assert!(row < self.height && col < self.width, "sample out of range");
        let real = self.buf.to_real();
        let base = (row * self.width + col) * self.channels;
        real[base..base + self.channels].to_vec()
    }

    /// Reindexes rows and columns, storage preserved.
    ///
    /// Index lists may repeat, reverse or drop indices; this is the
    /// primitive behind cropping and flipping.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Pixels {
        let (w, c) = (self.width, self.channels);
        let buf = match &self.buf {
            PixelBuffer::Real(d) => PixelBuffer::Real(gather(d, w, c, rows, cols)),
            PixelBuffer::Byte(d) => PixelBuffer::Byte(gather(d, w, c, rows, cols)),
            PixelBuffer::Bit16(d) => PixelBuffer::Bit16(gather(d, w, c, rows, cols)),
            PixelBuffer::Bit32(d) => PixelBuffer::Bit32(gather(d, w, c, rows, cols)),
            PixelBuffer::Bit(d) => PixelBuffer::Bit(gather(d, w, c, rows, cols)),
        };
        Pixels {
            buf,
            height: rows.len(),
            width: cols.len(),
            channels: c,
        }
    }

    /// Swaps the row and column axes; the channel axis is never disturbed.
    pub fn transpose(&self) -> Pixels {
        let (h, w, c) = self.shape();
        let buf = match &self.buf {
            PixelBuffer::Real(d) => PixelBuffer::Real(transpose_data(d, h, w, c)),
            PixelBuffer::Byte(d) => PixelBuffer::Byte(transpose_data(d, h, w, c)),
            PixelBuffer::Bit16(d) => PixelBuffer::Bit16(transpose_data(d, h, w, c)),
            PixelBuffer::Bit32(d) => PixelBuffer::Bit32(transpose_data(d, h, w, c)),
            PixelBuffer::Bit(d) => PixelBuffer::Bit(transpose_data(d, h, w, c)),
        };
        Pixels {
            buf,
            height: w,
            width: h,
            channels: c,
        }
    }

    pub(crate) fn feed_hasher<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.height);
        state.write_usize(self.width);
        state.write_usize(self.channels);
        self.buf.feed_hasher(state);
    }
}

impl PartialEq for Pixels {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.buf.bit_eq(&other.buf)
    }
}

impl Eq for Pixels {}

fn take_channel<T: Copy>(data: &[T], channels: usize, channel: usize) -> Vec<T> {
    data.chunks_exact(channels).map(|px| px[channel]).collect()
}

fn gather<T: Copy>(data: &[T], width: usize, channels: usize, rows: &[usize], cols: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len() * cols.len() * channels);
    for &r in rows {
        for &c in cols {
            let base = (r * width + c) * channels;
            out.extend_from_slice(&data[base..base + channels]);
        }
    }
    out
}

fn transpose_data<T: Copy>(data: &[T], height: usize, width: usize, channels: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for x in 0..width {
        for y in 0..height {
            let base = (y * width + x) * channels;
            out.extend_from_slice(&data[base..base + channels]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_names_round_trip() {
        for st in [
            StorageType::Real,
            StorageType::Byte,
            StorageType::Bit16,
            StorageType::Bit32,
            StorageType::Bit,
        ] {
            assert_eq!(st.name().parse::<StorageType>().unwrap(), st);
        }
        assert!("Bytf".parse::<StorageType>().is_err());
    }

    #[test]
    fn test_byte_cast_rounds_and_clips() {
        let buf = PixelBuffer::Real(vec![0.0, 0.2, 0.5, 1.0, 1.5, -0.25]);
        match buf.cast(StorageType::Byte) {
            PixelBuffer::Byte(d) => assert_eq!(d, vec![0, 51, 128, 255, 255, 0]),
            other => panic!("expected byte buffer, got {:?}", other.storage_type()),
        }
    }

    #[test]
    fn test_byte_real_round_trip_within_one_step() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        let buf = PixelBuffer::Real(values.clone());
        let back = buf.cast(StorageType::Byte).cast(StorageType::Real);
        match back {
            PixelBuffer::Real(d) => {
                for (x, y) in values.iter().zip(&d) {
                    assert!((x - y).abs() <= 1.0 / 255.0, "{x} vs {y}");
                }
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_integer_casts_rescale_proportionally() {
        let buf = PixelBuffer::Byte(vec![0, 255, 128]);
        match buf.cast(StorageType::Bit16) {
            PixelBuffer::Bit16(d) => assert_eq!(d, vec![0, 65535, 32896]),
            _ => unreachable!(),
        }
        let buf = PixelBuffer::Bit16(vec![0, 65535, 257]);
        match buf.cast(StorageType::Byte) {
            PixelBuffer::Byte(d) => assert_eq!(d, vec![0, 255, 1]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bit_cast_truncates_not_thresholds() {
        let buf = PixelBuffer::Real(vec![0.0, 0.7, 0.9999, 1.0, 2.5, -1.2]);
        match buf.cast(StorageType::Bit) {
            PixelBuffer::Bit(d) => assert_eq!(d, vec![false, false, false, true, true, true]),
            _ => unreachable!(),
        }
        let buf = PixelBuffer::Byte(vec![0, 1, 200]);
        match buf.cast(StorageType::Bit) {
            PixelBuffer::Bit(d) => assert_eq!(d, vec![false, true, true]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bit_source_normalizes_to_unit() {
        let buf = PixelBuffer::Bit(vec![false, true]);
        assert_eq!(buf.to_real(), vec![0.0, 1.0]);
        match buf.cast(StorageType::Byte) {
            PixelBuffer::Byte(d) => assert_eq!(d, vec![0, 255]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_pixels_shape_validation() {
        assert!(Pixels::from_real(vec![0.0; 6], 2, 3, 1).is_some());
        assert!(Pixels::from_real(vec![0.0; 5], 2, 3, 1).is_none());
    }

    #[test]
    fn test_plane_and_channel() {
        // 1x2 RGB image
        let px = Pixels::from_real(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 1, 2, 3).unwrap();
        assert_eq!(px.plane(1), vec![0.2, 0.5]);
        let g = px.channel(1);
        assert_eq!(g.shape(), (1, 2, 1));
        assert_eq!(g.to_real_vec(), vec![0.2, 0.5]);
    }

    #[test]
    fn test_select_reverses_and_crops() {
        // 2x3 single-channel
        let px = Pixels::from_real(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3, 1).unwrap();
        let flipped = px.select(&[1, 0], &[0, 1, 2]);
        assert_eq!(flipped.to_real_vec(), vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
        let cropped = px.select(&[0], &[1, 2]);
        assert_eq!(cropped.shape(), (1, 2, 1));
        assert_eq!(cropped.to_real_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_transpose_keeps_channels() {
        let px = Pixels::from_real(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 1, 2, 3).unwrap();
        let t = px.transpose();
        assert_eq!(t.shape(), (2, 1, 3));
        assert_eq!(t.to_real_vec(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_from_planes_interleaves() {
        let planes = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let px = Pixels::from_planes(&planes, 1, 2).unwrap();
        assert_eq!(px.to_real_vec(), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_bit_exact_equality() {
        let a = Pixels::from_real(vec![0.5; 4], 2, 2, 1).unwrap();
        let b = Pixels::from_real(vec![0.5; 4], 2, 2, 1).unwrap();
        assert_eq!(a, b);
        let c = a.cast(StorageType::Byte);
        assert_ne!(a, c);
    }
}
