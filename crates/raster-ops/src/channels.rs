//! Channel separation and combination.

use crate::error::{OpsError, OpsResult};
use crate::rect_shape;
use raster_core::{ColorSpace, ImageValue, Metadata, Pixels};
use tracing::trace;

/// Splits the image into one single-channel Grayscale image per channel,
/// storage preserved.
pub fn color_separate(image: &ImageValue) -> Vec<ImageValue> {
    trace!(channels = image.channels(), "color_separate");
    (0..image.channels())
        .map(|i| {
            let plane = image.pixels().channel(i);
            match ImageValue::from_pixels(plane, ColorSpace::Grayscale, image.metadata().clone()) {
                Some(img) => img,
                None => unreachable!("single-channel planes always form a Grayscale image"),
            }
        })
        .collect()
}

/// Stacks equal-shaped value matrices into one image of the given color
/// space.
///
/// The matrix count must be the space's own channel count (or, for RGB,
/// one more for alpha); anything else - or mismatched or jagged matrices -
/// is an invalid-parameter error.
pub fn color_combine(channels: &[Vec<Vec<f64>>], space: ColorSpace) -> OpsResult<ImageValue> {
    let first = channels.first().ok_or_else(|| {
        OpsError::InvalidParameter("color combination needs at least one channel".into())
    })?;
    let (height, width) = rect_shape(first)
        .ok_or_else(|| OpsError::InvalidParameter("channel 1 is not a rectangular matrix".into()))?;
    let mut planes = Vec::with_capacity(channels.len());
    for (i, channel) in channels.iter().enumerate() {
        match rect_shape(channel) {
            Some(shape) if shape == (height, width) => {
                planes.push(channel.iter().flatten().copied().collect::<Vec<f64>>());
            }
            Some(_) => {
                return Err(OpsError::InvalidParameter(format!(
                    "channel {} does not match the {height}x{width} shape of channel 1",
                    i + 1
                )));
            }
            None => {
                return Err(OpsError::InvalidParameter(format!(
                    "channel {} is not a rectangular matrix",
                    i + 1
                )));
            }
        }
    }
    trace!(height, width, channels = planes.len(), space = space.name(), "color_combine");
    let pixels = match Pixels::from_planes(&planes, height, width) {
        Some(px) => px,
        None => unreachable!("planes were validated to share one shape"),
    };
    ImageValue::from_pixels(pixels, space, Metadata::new()).ok_or_else(|| {
        OpsError::InvalidParameter(format!(
            "cannot combine {} channels into a {} image",
            channels.len(),
            space.name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::StorageType;

    #[test]
    fn test_separate_then_combine_round_trips() {
        let img = ImageValue::from_tensor(
            &[
                vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.75, 0.0]],
                vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.25, 0.5]],
            ],
            ColorSpace::Rgb,
        )
        .unwrap();
        let parts = color_separate(&img);
        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(part.color_space(), ColorSpace::Grayscale);
            assert_eq!(part.channels(), 1);
        }
        let matrices: Vec<Vec<Vec<f64>>> = parts
            .iter()
            .map(|p| {
                p.pixels()
                    .to_real_vec()
                    .chunks_exact(p.width())
                    .map(<[f64]>::to_vec)
                    .collect()
            })
            .collect();
        let combined = color_combine(&matrices, ColorSpace::Rgb).unwrap();
        assert_eq!(combined.pixels().to_real_vec(), img.pixels().to_real_vec());
    }

    #[test]
    fn test_separate_preserves_storage() {
        let img = ImageValue::from_matrix(&[vec![0.5, 1.0]], ColorSpace::Grayscale).unwrap();
        let byte = ImageValue::from_pixels(
            img.pixels_as(StorageType::Byte),
            ColorSpace::Grayscale,
            Metadata::new(),
        )
        .unwrap();
        let parts = color_separate(&byte);
        assert_eq!(parts[0].storage_type(), StorageType::Byte);
    }

    #[test]
    fn test_combine_concrete_rgb() {
        let channels = vec![
            vec![vec![1.0, 0.0], vec![0.0, 0.75]],
            vec![vec![0.0, 1.0], vec![0.0, 0.25]],
            vec![vec![0.0, 0.0], vec![1.0, 0.5]],
        ];
        let img = color_combine(&channels, ColorSpace::Rgb).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(
            img.pixels().sample(1, 1),
            vec![0.75, 0.25, 0.5]
        );
    }

    #[test]
    fn test_combine_rejects_mismatched_shapes() {
        let channels = vec![vec![vec![1.0, 0.0]], vec![vec![1.0]]];
        let err = color_combine(&channels, ColorSpace::Rgb).unwrap_err();
        assert!(err.to_string().contains("channel 2"));
    }

    #[test]
    fn test_combine_rejects_wrong_channel_count_for_space() {
        let channel = vec![vec![1.0, 0.0]];
        let err = color_combine(&[channel.clone(), channel], ColorSpace::Rgb).unwrap_err();
        assert!(err.to_string().contains("RGB"));
    }
}
