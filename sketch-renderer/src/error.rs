//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while encoding or decoding rasters.
///
/// None of these are retryable: the surface or payload itself is malformed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface has no pixels to encode.
    #[error("cannot encode a zero-area surface ({width}x{height})")]
    EmptySurface {
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },

    /// The image encoder rejected the surface.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// An encoded image or data URI could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The requested output format is not supported.
    #[error("unsupported raster format: {0}")]
    UnsupportedFormat(String),
}
