//! Threshold estimation and binarization.
//!
//! Thresholds are computed on the grayscale reduction of the image;
//! binarization produces Bit-storage masks. Cluster-based threshold
//! estimation (Otsu) belongs to the external feature-detection backend
//! and is not provided here.

use raster_core::{ColorSpace, ImageValue, PixelBuffer, Pixels};
use tracing::trace;

/// How to estimate a binarization threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Arithmetic mean of the grayscale samples.
    Mean,
    /// Median of the grayscale samples.
    Median,
}

/// Estimates a threshold suitable for binarizing the image.
///
/// Returns `0.0` for an empty image.
pub fn threshold(image: &ImageValue, method: ThresholdMethod) -> f64 {
    let samples = image.grayscale().pixels().to_real_vec();
    trace!(?method, samples = samples.len(), "threshold");
    if samples.is_empty() {
        return 0.0;
    }
    match method {
        ThresholdMethod::Mean => samples.iter().sum::<f64>() / samples.len() as f64,
        ThresholdMethod::Median => {
            let mut sorted = samples;
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 1 {
                sorted[mid]
            } else {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            }
        }
    }
}

fn mask_image(image: &ImageValue, mask: Vec<bool>) -> ImageValue {
    let gray = image.grayscale();
    let (h, w, _) = gray.pixels().shape();
    let pixels = match Pixels::new(PixelBuffer::Bit(mask), h, w, 1) {
        Some(px) => px,
        None => unreachable!("mask keeps the grayscale shape"),
    };
    match ImageValue::from_pixels(pixels, ColorSpace::Grayscale, image.metadata().clone()) {
        Some(img) => img,
        None => unreachable!("single-channel masks always form a Grayscale image"),
    }
}

/// Binarizes: samples strictly above `t` map to 1, the rest to 0.
pub fn binarize(image: &ImageValue, t: f64) -> ImageValue {
    let samples = image.grayscale().pixels().to_real_vec();
    mask_image(image, samples.iter().map(|&v| v > t).collect())
}

/// Band binarization: samples strictly between `t1` and `t2` map to 1.
pub fn binarize_band(image: &ImageValue, t1: f64, t2: f64) -> ImageValue {
    let samples = image.grayscale().pixels().to_real_vec();
    mask_image(image, samples.iter().map(|&v| v > t1 && v < t2).collect())
}

/// Binarizes at the median threshold.
pub fn binarize_auto(image: &ImageValue) -> ImageValue {
    binarize(image, threshold(image, ThresholdMethod::Median))
}
