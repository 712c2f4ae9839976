//! Rank linearization and pseudocolor support.
//!
//! [`linearize`] maps an arbitrary set of real values to dense, stably
//! ordered integer indices: every element receives the 0-based rank of its
//! value within the sorted distinct set. The ranks are computed with a
//! vectorized binary search - all elements are processed in lock-step,
//! halving the candidate range each round - rather than an elementwise
//! lookup, which keeps large arrays cheap.
//!
//! [`colorize`] is the pseudocolor consumer: ranks index into a supplied
//! palette, one color per distinct value.

use crate::error::{OpsError, OpsResult};
use crate::rect_shape;
use raster_core::{ColorSpace, ImageValue, Metadata, Pixels, StorageType};
use tracing::trace;

/// Assigns each element the 0-based rank of its value within the sorted
/// distinct set. Returns the ranks (input order preserved) and the number
/// of distinct values.
///
/// Ties always receive the same rank; rank 0 is the minimum. The distinct
/// count is bounded by the element count - callers must tolerate that
/// worst case.
pub fn linearize(values: &[f64]) -> (Vec<usize>, usize) {
    if values.is_empty() {
        return (Vec::new(), 0);
    }

    let mut distinct = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    let n = distinct.len();

    // Lock-step binary search: every element keeps a candidate range
    // (lower, upper) into the distinct set, and all ranges are halved
    // together each round.
    let mut lower = vec![0usize; values.len()];
    let mut upper = vec![n - 1; values.len()];
    let mut q = n; // worst-case partition size
    while q > 2 {
        for (i, &v) in values.iter().enumerate() {
            let m = (lower[i] + upper[i]) >> 1;
            if v <= distinct[m] {
                upper[i] = m;
            } else {
                lower[i] = m + 1;
            }
        }
        q = q.div_ceil(2);
    }

    let ranks = values
        .iter()
        .enumerate()
        .map(|(i, &v)| if v == distinct[lower[i]] { lower[i] } else { upper[i] })
        .collect();
    (ranks, n)
}

/// Pseudocolors a rectangular matrix of values: equal values share a
/// palette color, distinct values never collide.
///
/// The palette must supply at least one color per distinct value; in the
/// degenerate worst case that is one per element.
pub fn colorize(values: &[Vec<f64>], palette: &[[f64; 3]]) -> OpsResult<ImageValue> {
    let (height, width) = rect_shape(values).ok_or_else(|| {
        OpsError::InvalidParameter("colorize values must form a rectangular matrix".into())
    })?;
    let flat: Vec<f64> = values.iter().flatten().copied().collect();
    let (ranks, n) = linearize(&flat);
    trace!(height, width, distinct = n, "colorize");
    if palette.len() < n {
        return Err(OpsError::InvalidParameter(format!(
            "palette provides {} colors but the values need {}",
            palette.len(),
            n
        )));
    }
    let mut data = Vec::with_capacity(height * width * 3);
    for rank in ranks {
        data.extend_from_slice(&palette[rank]);
    }
    let pixels = match Pixels::from_real(data, height, width, 3) {
        Some(px) => px,
        None => unreachable!("rank matrix keeps the source shape"),
    };
    match ImageValue::from_pixels(pixels, ColorSpace::Rgb, Metadata::new()) {
        Some(img) => Ok(img),
        None => unreachable!("three channels always form an RGB image"),
    }
}

/// Pseudocolors an image: reduced to grayscale, quantized to bytes, then
/// colorized like a value matrix.
pub fn colorize_image(image: &ImageValue, palette: &[[f64; 3]]) -> OpsResult<ImageValue> {
    let gray = image.grayscale().pixels_as(StorageType::Byte);
    let plane = gray.cast(StorageType::Real).plane(0);
    let rows: Vec<Vec<f64>> = plane.chunks_exact(gray.width().max(1)).map(<[f64]>::to_vec).collect();
    colorize(&rows, palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_scenario() {
        let values = [1.3, 2.1, 1.5, 1.3, 1.3, 2.1];
        let (ranks, n) = linearize(&values);
        assert_eq!(n, 3);
        assert_eq!(ranks, vec![0, 2, 1, 0, 0, 2]);
    }

    #[test]
    fn test_distinct_count_matches_set() {
        let values = [5.0, 1.0, 5.0, 3.0, 1.0, 9.0];
        let (_, n) = linearize(&values);
        assert_eq!(n, 4);
    }

    #[test]
    fn test_ties_share_ranks_and_order_is_ascending() {
        let values = [0.3, 0.1, 0.2, 0.1, 0.3];
        let (ranks, n) = linearize(&values);
        assert_eq!(n, 3);
        assert_eq!(ranks, vec![2, 0, 1, 0, 2]);
    }

    #[test]
    fn test_all_equal() {
        let (ranks, n) = linearize(&[7.5; 10]);
        assert_eq!(n, 1);
        assert!(ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_two_distinct_values() {
        let (ranks, n) = linearize(&[2.0, 1.0, 2.0]);
        assert_eq!(n, 2);
        assert_eq!(ranks, vec![1, 0, 1]);
    }

    #[test]
    fn test_empty_input() {
        let (ranks, n) = linearize(&[]);
        assert!(ranks.is_empty());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_descending_input_stays_dense() {
        let values: Vec<f64> = (0..64).rev().map(|i| i as f64).collect();
        let (ranks, n) = linearize(&values);
        assert_eq!(n, 64);
        assert_eq!(ranks, (0..64).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_worst_case_all_distinct() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64).sin()).collect();
        let (ranks, n) = linearize(&values);
        assert_eq!(n, 1000);
        let mut seen = vec![false; n];
        for r in ranks {
            seen[r] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_colorize_assigns_one_color_per_value() {
        let palette = [[0.0, 0.0, 0.0], [0.5, 0.5, 0.5], [1.0, 1.0, 1.0]];
        let img = colorize(
            &[vec![1.3, 2.1, 1.5], vec![1.3, 1.3, 2.1]],
            &palette,
        )
        .unwrap();
        assert_eq!(img.color_space(), ColorSpace::Rgb);
        assert_eq!(img.dimensions(), (3, 2));
        let vals = img.pixels().to_real_vec();
        assert_eq!(&vals[..3], &[0.0, 0.0, 0.0]); // rank 0
        assert_eq!(&vals[3..6], &[1.0, 1.0, 1.0]); // rank 2
        assert_eq!(&vals[6..9], &[0.5, 0.5, 0.5]); // rank 1
    }

    #[test]
    fn test_colorize_rejects_short_palette() {
        let err = colorize(&[vec![1.0, 2.0, 3.0]], &[[0.0; 3]]).unwrap_err();
        assert!(err.to_string().contains("palette"));
    }

    #[test]
    fn test_colorize_rejects_jagged_matrix() {
        let err = colorize(&[vec![1.0], vec![1.0, 2.0]], &[[0.0; 3]]).unwrap_err();
        assert!(err.to_string().contains("rectangular"));
    }
}
