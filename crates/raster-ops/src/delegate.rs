//! Marshaling seam for delegated morphology backends.
//!
//! Dilation, erosion, opening and closing are computed entirely by an
//! external morphology library; this crate's obligation is to marshal a
//! single-channel numeric plane in and a same-shaped plane back. The
//! supported operations form a closed tagged enumeration - the backend is
//! handed the variant, never a name to resolve.

use crate::error::{OpsError, OpsResult};
use crate::filter::Kernel;
use raster_core::{ColorSpace, ImageValue, Pixels};
use tracing::debug;

/// Operations computed by the external morphology backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegatedOp {
    /// Morphological dilation.
    Dilation,
    /// Morphological erosion.
    Erosion,
    /// Erosion followed by dilation.
    Opening,
    /// Dilation followed by erosion.
    Closing,
}

impl DelegatedOp {
    /// Canonical name.
    pub const fn name(self) -> &'static str {
        match self {
            DelegatedOp::Dilation => "Dilation",
            DelegatedOp::Erosion => "Erosion",
            DelegatedOp::Opening => "Opening",
            DelegatedOp::Closing => "Closing",
        }
    }
}

/// Result of a delegated morphology call.
#[derive(Debug, Clone)]
pub struct Delegated {
    /// The wrapped backend output, always Grayscale.
    pub image: ImageValue,
    /// Whether the input had to be reduced to grayscale first, so the
    /// caller can warn that color images are not supported.
    pub converted_to_grayscale: bool,
}

/// Runs a delegated morphology operation.
///
/// The image is forced to Grayscale when needed, its single channel is
/// handed to `backend` as a normalized-float plane of `(height, width)`
/// together with the structuring element, and the returned plane - which
/// must be same-shaped - is wrapped back into a Grayscale image carrying
/// the input's metadata.
pub fn morphology<F>(
    image: &ImageValue,
    op: DelegatedOp,
    element: &Kernel,
    backend: F,
) -> OpsResult<Delegated>
where
    F: FnOnce(DelegatedOp, &[f64], (usize, usize), &Kernel) -> Vec<f64>,
{
    let converted = image.color_space() != ColorSpace::Grayscale;
    if converted {
        debug!(op = op.name(), "converting color input to grayscale");
    }
    let gray = image.grayscale();
    let (height, width, _) = gray.pixels().shape();
    let plane = gray.pixels().plane(0);

    let out = backend(op, &plane, (height, width), element);
    if out.len() != height * width {
        return Err(OpsError::DelegateShape {
            expected: height * width,
            got: out.len(),
        });
    }
    let pixels = match Pixels::from_real(out, height, width, 1) {
        Some(px) => px,
        None => unreachable!("backend output length was just validated"),
    };
    let wrapped =
        match ImageValue::from_pixels(pixels, ColorSpace::Grayscale, image.metadata().clone()) {
            Some(img) => img,
            None => unreachable!("single-channel planes always form a Grayscale image"),
        };
    Ok(Delegated {
        image: wrapped,
        converted_to_grayscale: converted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invert_backend(_op: DelegatedOp, plane: &[f64], _shape: (usize, usize), _k: &Kernel) -> Vec<f64> {
        plane.iter().map(|v| 1.0 - v).collect()
    }

    #[test]
    fn test_marshals_plane_and_wraps_result() {
        let img = ImageValue::from_matrix(&[vec![0.25, 1.0]], ColorSpace::Grayscale).unwrap();
        let element = Kernel::box_matrix(1.0).unwrap();
        let out = morphology(&img, DelegatedOp::Dilation, &element, invert_backend).unwrap();
        assert!(!out.converted_to_grayscale);
        assert_eq!(out.image.pixels().to_real_vec(), vec![0.75, 0.0]);
        assert_eq!(out.image.color_space(), ColorSpace::Grayscale);
    }

    #[test]
    fn test_forces_grayscale_and_reports_it() {
        let img = ImageValue::from_tensor(
            &[vec![vec![1.0, 1.0, 1.0]]],
            ColorSpace::Rgb,
        )
        .unwrap();
        let element = Kernel::box_matrix(1.0).unwrap();
        let out = morphology(&img, DelegatedOp::Erosion, &element, invert_backend).unwrap();
        assert!(out.converted_to_grayscale);
        assert_eq!(out.image.channels(), 1);
    }

    #[test]
    fn test_wrong_backend_shape_is_error() {
        let img = ImageValue::from_matrix(&[vec![0.5, 0.5]], ColorSpace::Grayscale).unwrap();
        let element = Kernel::box_matrix(1.0).unwrap();
        let err = morphology(&img, DelegatedOp::Closing, &element, |_, _, _, _| vec![0.0])
            .unwrap_err();
        assert!(matches!(err, OpsError::DelegateShape { expected: 2, got: 1 }));
    }
}
