//! Kernel convolution with edge-clamped boundaries.
//!
//! # Kernels
//!
//! - [`Kernel::from_matrix`] - arbitrary rectangular weight matrix
//! - [`Kernel::box_matrix`] - all-ones square
//! - [`Kernel::disk_matrix`] - ones inside a disk
//! - [`Kernel::diamond_matrix`] - ones inside a diamond
//!
//! The shaped constructors produce unnormalized 0/1 matrices; callers
//! scale the weights themselves (e.g. divide a disk by its area).
//!
//! # Example
//!
//! ```rust
//! use raster_core::{ColorSpace, ImageValue};
//! use raster_ops::filter::{convolve, Kernel};
//!
//! let img = ImageValue::from_matrix(
//!     &[vec![0.5; 4], vec![0.5; 4], vec![0.5; 4], vec![0.5; 4]],
//!     ColorSpace::Grayscale,
//! )
//! .unwrap();
//! let kernel =
//!     Kernel::from_matrix(&[vec![1.0 / 9.0; 3], vec![1.0 / 9.0; 3], vec![1.0 / 9.0; 3]]).unwrap();
//! let out = convolve(&img, &kernel);
//! assert_eq!(out.dimensions(), (4, 4));
//! ```

use crate::error::{OpsError, OpsResult};
use crate::rebuild;
use raster_core::{ImageValue, Pixels, StorageType};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

/// Convolution kernel: a rectangular matrix of weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Kernel weights, row-major.
    pub data: Vec<f64>,
    /// Kernel width.
    pub width: usize,
    /// Kernel height.
    pub height: usize,
}

impl Kernel {
    /// Builds a kernel from a nested matrix.
    ///
    /// Rejects empty or jagged input before any computation.
    pub fn from_matrix(rows: &[Vec<f64>]) -> OpsResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(OpsError::MalformedKernel("kernel matrix is empty".into()));
        }
        if rows.iter().any(|r| r.len() != width) {
            return Err(OpsError::MalformedKernel(
                "kernel rows have unequal lengths".into(),
            ));
        }
        Ok(Self {
            data: rows.iter().flatten().copied().collect(),
            width,
            height,
        })
    }

    /// All-ones square of side `floor(1 + 2r)`.
    pub fn box_matrix(r: f64) -> OpsResult<Self> {
        let r = positive_radius(r)?;
        let s = (1.0 + 2.0 * r).floor() as usize;
        Ok(Self {
            data: vec![1.0; s * s],
            width: s,
            height: s,
        })
    }

    /// Ones where `x^2 + y^2 <= (r + 1/2)^2`, side `2*floor(1/2 + r) + 1`.
    pub fn disk_matrix(r: f64) -> OpsResult<Self> {
        let r = positive_radius(r)?;
        let s = (0.5 + r).floor() as i64;
        let r_sqr = (r + 0.5) * (r + 0.5);
        let mut data = Vec::with_capacity(((2 * s + 1) * (2 * s + 1)) as usize);
        for y in -s..=s {
            for x in -s..=s {
                data.push(if ((x * x + y * y) as f64) <= r_sqr { 1.0 } else { 0.0 });
            }
        }
        let side = (2 * s + 1) as usize;
        Ok(Self {
            data,
            width: side,
            height: side,
        })
    }

    /// Ones where `|x| + |y| <= floor(1/2 + r)`, side `2*floor(1/2 + r) + 1`.
    pub fn diamond_matrix(r: f64) -> OpsResult<Self> {
        let r = positive_radius(r)?;
        let t = (0.5 + r).floor() as i64;
        let mut data = Vec::with_capacity(((2 * t + 1) * (2 * t + 1)) as usize);
        for y in -t..=t {
            for x in -t..=t {
                data.push(if x.abs() + y.abs() <= t { 1.0 } else { 0.0 });
            }
        }
        let side = (2 * t + 1) as usize;
        Ok(Self {
            data,
            width: side,
            height: side,
        })
    }

    /// Kernel center offsets `(cy, cx)`.
    #[inline]
    fn center(&self) -> (usize, usize) {
        ((self.height - 1) / 2, (self.width - 1) / 2)
    }
}

fn positive_radius(r: f64) -> OpsResult<f64> {
    if r > 0.0 {
        Ok(r)
    } else {
        Err(OpsError::InvalidParameter(format!(
            "kernel radius must be positive, got {r}"
        )))
    }
}

/// Convolves the image with a 2-D kernel.
///
/// Pixels are cast to normalized floats first; each channel is convolved
/// independently against the same kernel and the channels are recombined
/// in their original order. Boundaries are edge-clamped: border pixels are
/// computed as if the image extended by replicating its edge values. The
/// color space is unchanged.
///
/// The per-channel loop runs in parallel under the `parallel` feature.
pub fn convolve(image: &ImageValue, kernel: &Kernel) -> ImageValue {
    trace!(
        width = image.width(),
        height = image.height(),
        channels = image.channels(),
        kernel_w = kernel.width,
        kernel_h = kernel.height,
        "convolve"
    );
    let real = image.pixels_as(StorageType::Real);
    let (h, w, channels) = real.shape();
    let planes: Vec<Vec<f64>> = (0..channels).map(|i| real.plane(i)).collect();

    #[cfg(feature = "parallel")]
    let convolved: Vec<Vec<f64>> = planes
        .par_iter()
        .map(|p| convolve_plane(p, w, h, kernel))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let convolved: Vec<Vec<f64>> = planes
        .iter()
        .map(|p| convolve_plane(p, w, h, kernel))
        .collect();

    let pixels = match Pixels::from_planes(&convolved, h, w) {
        Some(px) => px,
        None => unreachable!("convolved planes keep the source shape"),
    };
    rebuild(image, pixels)
}

/// True convolution (kernel flipped) of one channel plane with edge
/// clamping.
fn convolve_plane(src: &[f64], width: usize, height: usize, kernel: &Kernel) -> Vec<f64> {
    let (cy, cx) = kernel.center();
    let mut dst = vec![0.0; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0;
            for ky in 0..kernel.height {
                for kx in 0..kernel.width {
                    let sy = (y as isize + cy as isize - ky as isize)
                        .clamp(0, height as isize - 1) as usize;
                    let sx = (x as isize + cx as isize - kx as isize)
                        .clamp(0, width as isize - 1) as usize;
                    sum += src[sy * width + sx] * kernel.data[ky * kernel.width + kx];
                }
            }
            dst[y * width + x] = sum;
        }
    }
    dst
}
