//! Error types for core sketch operations.

use thiserror::Error;

/// Result type for core sketch operations.
pub type SketchResult<T> = Result<T, SketchError>;

/// Errors that can occur when building core values.
#[derive(Debug, Error)]
pub enum SketchError {
    /// Pixel buffer length does not match the declared dimensions.
    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        /// Declared surface width.
        width: u32,
        /// Declared surface height.
        height: u32,
        /// Expected buffer length in bytes.
        expected: usize,
        /// Actual buffer length in bytes.
        actual: usize,
    },

    /// A service mode string could not be parsed.
    #[error("unknown service mode: {0} (expected \"online\" or \"offline\")")]
    UnknownMode(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
