//! Error types for raster-core operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the core image value type.
///
/// These cover the two name-resolution surfaces of the crate: pixel
/// storage-format names and color-space names. Structural failures
/// (raw data that cannot form an image, an unconvertible color-space
/// pair) are deliberately NOT errors; they are signalled by `None`
/// from the corresponding constructors and conversions so that
/// callers can fall back to leaving the originating expression
/// unevaluated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A pixel storage-format name that is not in the registry.
    #[error("unsupported pixel format \"{0}\"")]
    UnsupportedPixelFormat(String),

    /// A color-space name that is not in the registry.
    #[error("unknown color space \"{0}\"")]
    UnknownColorSpace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_quote_the_name() {
        let err = Error::UnsupportedPixelFormat("Bytf".into());
        assert!(err.to_string().contains("Bytf"));
        let err = Error::UnknownColorSpace("YUV".into());
        assert!(err.to_string().contains("YUV"));
    }
}
