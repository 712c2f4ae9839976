//! Pixel arithmetic reduction.
//!
//! One image combines with a sequence of operands - numbers or images -
//! under a single binary operator, reducing strictly left-to-right over
//! the normalized-float representation, then clipping to `[0, 1]`.
//!
//! The operator set is a closed tagged enumeration ([`ArithOp`]) mapping
//! each operation to its concrete combining function; nothing is resolved
//! by name at runtime.

use crate::error::{OpsError, OpsResult};
use raster_core::{ImageValue, Pixels};
use tracing::trace;

/// The supported binary pixel operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Elementwise addition.
    Add,
    /// Elementwise multiplication.
    Multiply,
    /// Elementwise subtraction.
    Subtract,
}

impl ArithOp {
    /// The concrete combining function for this operator.
    #[inline]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Multiply => a * b,
            ArithOp::Subtract => a - b,
        }
    }
}

/// One argument of an arithmetic reduction.
///
/// `Other` is the marshaling boundary's rendition of an argument the
/// evaluator could coerce to neither a number nor an image; reducing over
/// it is the type error that identifies the offending operand.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A scalar, broadcast over every sample.
    Number(f64),
    /// An image of compatible shape.
    Image(ImageValue),
    /// Anything else, by display form.
    Other(String),
}

/// Reduces `image` with `operands` left-to-right under `op`, clipping the
/// result to `[0, 1]`.
///
/// The image seeds the accumulator as a fresh copy, so later in-place
/// combination cannot corrupt a shared input. Scalars broadcast; an image
/// operand must have the accumulator's shape, or match its height and
/// width with a single channel (broadcast across channels). The result
/// carries the first image's color space and metadata in Real storage.
pub fn arithmetic(image: &ImageValue, op: ArithOp, operands: &[Operand]) -> OpsResult<ImageValue> {
    trace!(?op, operands = operands.len(), "arithmetic");
    let (height, width, channels) = image.pixels().shape();
    // Fresh copy, never an alias of the input buffer.
    let mut acc = image.pixels().to_real_vec();

    for (i, operand) in operands.iter().enumerate() {
        // 1-based, counting the leading image as argument 1.
        let position = i + 2;
        match operand {
            Operand::Number(n) => {
                for v in &mut acc {
                    *v = op.apply(*v, *n);
                }
            }
            Operand::Image(other) => {
                let shape = other.pixels().shape();
                let data = other.pixels().to_real_vec();
                if shape == (height, width, channels) {
                    for (v, o) in acc.iter_mut().zip(&data) {
                        *v = op.apply(*v, *o);
                    }
                } else if shape == (height, width, 1) {
                    for (v, o) in acc.chunks_exact_mut(channels).zip(&data) {
                        for sample in v {
                            *sample = op.apply(*sample, *o);
                        }
                    }
                } else {
                    return Err(OpsError::ShapeMismatch {
                        position,
                        expected: (height, width, channels),
                        got: shape,
                    });
                }
            }
            Operand::Other(shown) => {
                return Err(OpsError::InvalidOperand {
                    position,
                    operand: shown.clone(),
                });
            }
        }
    }

    for v in &mut acc {
        *v = v.clamp(0.0, 1.0);
    }
    let pixels = match Pixels::from_real(acc, height, width, channels) {
        Some(px) => px,
        None => unreachable!("accumulator keeps the source shape"),
    };
    Ok(crate::rebuild(image, pixels))
}
