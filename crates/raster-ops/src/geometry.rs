//! Geometric index normalization: take/crop, partition, pixel addressing.
//!
//! User-facing indices are 1-based and may be negative (counted from the
//! end of an axis) or reversed (start past end selects the sub-range
//! flipped). [`take_rows`], [`take`] and [`take2`] normalize such specs;
//! [`take2`] is the straightforward composition of two independent
//! single-axis takes, rows then columns.
//!
//! Single-point addressing uses a bottom-left origin: row 1 is the BOTTOM
//! row, column 1 the left edge, while storage is row-major with the top
//! row first. [`image_coords`] is the one conversion point between the two
//! - the `height - y` arithmetic lives nowhere else.

use crate::error::{OpsError, OpsResult};
use crate::rebuild;
use raster_core::ImageValue;
use tracing::trace;

/// Resolves one 1-based, possibly non-positive bound against an axis of
/// extent `n`, clamped to `[0, n]`.
fn resolve_bound(bound: i64, n: usize) -> usize {
    let raw = if bound > 0 {
        bound - 1
    } else {
        n as i64 + bound
    };
    raw.clamp(0, n as i64) as usize
}

/// Normalizes a `(first, last)` pair into the list of selected 0-based
/// indices, reversed when the resolved start exceeds the resolved end.
/// Empty only when the normalized bounds collapse outside the axis.
fn normalize_span(first: i64, last: i64, n: usize) -> Vec<usize> {
    let a = resolve_bound(first, n);
    let b = resolve_bound(last, n);
    let lo = a.min(b);
    let hi = a.max(b);
    if n == 0 || lo >= n {
        return Vec::new();
    }
    let hi = hi.min(n - 1);
    let indices = lo..=hi;
    if a > b {
        indices.rev().collect()
    } else {
        indices.collect()
    }
}

/// Takes the first `n` rows of the image, or the last `|n|` rows when `n`
/// is negative.
///
/// `n = 0` yields an empty image, not an error; `|n| >= height` yields the
/// whole image unchanged.
pub fn take_rows(image: &ImageValue, n: i64) -> ImageValue {
    trace!(n, height = image.height(), "take_rows");
    let height = image.height();
    let rows: Vec<usize> = if n >= 0 {
        (0..height.min(n as usize)).collect()
    } else {
        let start = height.saturating_sub(n.unsigned_abs() as usize);
        (start..height).collect()
    };
    let cols: Vec<usize> = (0..image.width()).collect();
    rebuild(image, image.pixels().select(&rows, &cols))
}

/// Takes the row span `rows = (first, last)` of the image.
pub fn take(image: &ImageValue, rows: (i64, i64)) -> ImageValue {
    trace!(?rows, height = image.height(), "take");
    let row_idx = normalize_span(rows.0, rows.1, image.height());
    let cols: Vec<usize> = (0..image.width()).collect();
    rebuild(image, image.pixels().select(&row_idx, &cols))
}

/// Crops to the given row and column spans - the composition of two
/// independent single-axis takes, rows first, then columns.
pub fn take2(image: &ImageValue, rows: (i64, i64), cols: (i64, i64)) -> ImageValue {
    trace!(?rows, ?cols, "take2");
    let row_idx = normalize_span(rows.0, rows.1, image.height());
    let col_idx = normalize_span(cols.0, cols.1, image.width());
    rebuild(image, image.pixels().select(&row_idx, &col_idx))
}

/// Partitions the image into an array of `w` x `h` pixel tiles, dropping
/// remainder blocks smaller than the tile size.
pub fn partition(image: &ImageValue, w: usize, h: usize) -> OpsResult<Vec<Vec<ImageValue>>> {
    if w == 0 || h == 0 {
        return Err(OpsError::InvalidParameter(format!(
            "{{{w}, {h}}} is not a valid size specification for image partitions"
        )));
    }
    trace!(w, h, "partition");
    let mut parts = Vec::new();
    for yi in 0..image.height() / h {
        let mut row = Vec::new();
        for xi in 0..image.width() / w {
            let rows: Vec<usize> = (yi * h..(yi + 1) * h).collect();
            let cols: Vec<usize> = (xi * w..(xi + 1) * w).collect();
            row.push(rebuild(image, image.pixels().select(&rows, &cols)));
        }
        if !row.is_empty() {
            parts.push(row);
        }
    }
    Ok(parts)
}

/// Converts user pixel coordinates (1-based, bottom-left origin) into
/// storage coordinates `(row, col)` (0-based, top-left origin).
///
/// Returns `None` outside `[1, width] x [1, height]`.
pub fn image_coords(x: i64, y: i64, width: usize, height: usize) -> Option<(usize, usize)> {
    if x < 1 || y < 1 || x as usize > width || y as usize > height {
        return None;
    }
    Some((height - y as usize, x as usize - 1))
}

/// Reads the pixel at user coordinates `{x, y}` in normalized-float form.
///
/// A lookup outside the image is a padding error, deliberately not
/// clamped.
pub fn pixel_value(image: &ImageValue, x: i64, y: i64) -> OpsResult<Vec<f64>> {
    let (row, col) = image_coords(x, y, image.width(), image.height())
        .ok_or(OpsError::PaddingNotImplemented)?;
    Ok(image.pixels().sample(row, col))
}

/// A matched pixel position in user coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PixelPosition {
    /// 1-based column, counted from the left edge.
    pub x: usize,
    /// 1-based row, counted from the bottom.
    pub y: usize,
    /// 1-based channel index; `None` for single-channel images.
    pub channel: Option<usize>,
}

/// Positions of all samples within `tolerance` of `value`, sorted.
///
/// Channel indices are reported only for multichannel images.
pub fn pixel_value_positions(image: &ImageValue, value: f64, tolerance: f64) -> Vec<PixelPosition> {
    let (height, width, channels) = image.pixels().shape();
    let real = image.pixels().to_real_vec();
    let mut out = Vec::new();
    for (i, v) in real.iter().enumerate() {
        if (v - value).abs() <= tolerance {
            let px = i / channels;
            let k = i % channels;
            out.push(PixelPosition {
                x: px % width + 1,
                y: height - px / width,
                channel: (channels > 1).then_some(k + 1),
            });
        }
    }
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::ColorSpace;

    fn gray(rows: &[Vec<f64>]) -> ImageValue {
        ImageValue::from_matrix(rows, ColorSpace::Grayscale).unwrap()
    }

    fn values(img: &ImageValue) -> Vec<f64> {
        img.pixels().to_real_vec()
    }

    fn sample() -> ImageValue {
        gray(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
            vec![10.0, 11.0, 12.0],
        ])
    }

    #[test]
    fn test_take_rows_positive() {
        let img = sample();
        assert_eq!(values(&take_rows(&img, 2)), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_take_rows_negative_takes_from_end() {
        let img = sample();
        assert_eq!(values(&take_rows(&img, -1)), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_take_rows_clamps_to_whole_image() {
        let img = sample();
        assert_eq!(take_rows(&img, 99), img);
        assert_eq!(take_rows(&img, -99), img);
    }

    #[test]
    fn test_take_zero_rows_is_empty_not_error() {
        let img = sample();
        let empty = take_rows(&img, 0);
        assert_eq!(empty.height(), 0);
        assert_eq!(empty.width(), 3);
    }

    #[test]
    fn test_take_span() {
        let img = sample();
        assert_eq!(values(&take(&img, (2, 3))), vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_take_negative_bounds_resolve_from_end() {
        let img = sample();
        // Rows -2..-1 are the last two rows.
        assert_eq!(
            values(&take(&img, (-2, -1))),
            vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]
        );
    }

    #[test]
    fn test_take_reversed_span_flips() {
        let img = sample();
        assert_eq!(
            values(&take(&img, (2, 1))),
            vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_take_collapsed_bounds_are_empty() {
        let img = sample();
        let out = take(&img, (5, 9));
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn test_take2_composes_independent_axes() {
        let img = sample();
        let cropped = take2(&img, (2, 3), (2, 3));
        assert_eq!(values(&cropped), vec![5.0, 6.0, 8.0, 9.0]);
        // Same result when the two single-axis takes run as separate steps.
        let rows_first = take(&img, (2, 3));
        let both = take2(&rows_first, (1, 2), (2, 3));
        assert_eq!(values(&both), values(&cropped));
    }

    #[test]
    fn test_partition_drops_remainder() {
        let img = sample(); // 3 wide, 4 tall
        let parts = partition(&img, 2, 2).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 1);
        assert_eq!(values(&parts[1][0]), vec![7.0, 8.0, 10.0, 11.0]);
    }

    #[test]
    fn test_partition_rejects_zero_size() {
        let img = sample();
        let err = partition(&img, 0, 300).unwrap_err();
        assert!(err.to_string().contains("{0, 300}"));
    }

    #[test]
    fn test_pixel_value_bottom_left_origin() {
        let img = sample();
        // {1, 1} is the bottom-left pixel.
        assert_eq!(pixel_value(&img, 1, 1).unwrap(), vec![10.0]);
        // {3, 4} is the top-right pixel.
        assert_eq!(pixel_value(&img, 3, 4).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_pixel_value_out_of_bounds_is_padding_error() {
        let img = sample();
        for (x, y) in [(0, 1), (4, 1), (1, 0), (1, 5)] {
            assert!(matches!(
                pixel_value(&img, x, y),
                Err(OpsError::PaddingNotImplemented)
            ));
        }
    }

    #[test]
    fn test_pixel_value_positions_sorted_bottom_left() {
        let img = gray(&[vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]]);
        let positions = pixel_value_positions(&img, 1.0, 0.0);
        let coords: Vec<(usize, usize)> = positions.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(1, 1), (1, 2), (2, 1), (2, 3)]);
        assert!(positions.iter().all(|p| p.channel.is_none()));
    }

    #[test]
    fn test_pixel_value_positions_reports_channels() {
        let img = ImageValue::from_tensor(
            &[vec![vec![0.5, 0.0, 0.0], vec![0.0, 0.5, 0.0]]],
            ColorSpace::Rgb,
        )
        .unwrap();
        let positions = pixel_value_positions(&img, 0.5, 0.0);
        assert_eq!(
            positions,
            vec![
                PixelPosition { x: 1, y: 1, channel: Some(1) },
                PixelPosition { x: 2, y: 1, channel: Some(2) },
            ]
        );
    }
}
