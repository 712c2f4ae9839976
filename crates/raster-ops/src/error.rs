//! Error types for image transforms.

use thiserror::Error;

/// Result type for image transforms.
pub type OpsResult<T> = Result<T, OpsError>;

/// Error type for image transforms.
///
/// Every variant is recoverable and identifies the offending parameter;
/// callers typically leave the triggering operation unevaluated rather
/// than aborting.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A reflection side pair outside the fixed table.
    #[error("{0} is not a valid 2D reflection specification")]
    InvalidReflectionSpec(String),

    /// Single-pixel lookup outside the image bounds. Deliberately not
    /// clamped, to avoid silently returning wrong pixels.
    #[error("padding not implemented for pixel value lookups")]
    PaddingNotImplemented,

    /// Arithmetic operand that is neither a number nor an image.
    /// Positions are 1-based and count the leading image.
    #[error("expecting a number or image instead of {operand} (argument {position})")]
    InvalidOperand {
        /// 1-based argument position.
        position: usize,
        /// Display form of the offending operand.
        operand: String,
    },

    /// Image operand whose shape cannot combine with the accumulator.
    #[error("argument {position} has shape {got:?}, incompatible with {expected:?}")]
    ShapeMismatch {
        /// 1-based argument position.
        position: usize,
        /// Accumulator shape `(height, width, channels)`.
        expected: (usize, usize, usize),
        /// Operand shape.
        got: (usize, usize, usize),
    },

    /// Kernel data that is not a rectangular numeric matrix.
    #[error("malformed kernel: {0}")]
    MalformedKernel(String),

    /// A delegated backend returned data of the wrong size.
    #[error("delegated backend returned {got} samples, expected {expected}")]
    DelegateShape {
        /// Expected sample count.
        expected: usize,
        /// Returned sample count.
        got: usize,
    },
}
