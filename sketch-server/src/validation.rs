//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use.

use sketch_renderer::ImageFormat;
use thiserror::Error;

/// Maximum decoded image size (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// Maximum request body size; leaves room for base64 expansion of an image.
pub const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;
/// Maximum length for guess IDs (UUIDs are 36 chars).
pub const MAX_GUESS_ID_LEN: usize = 64;
/// Maximum length for a feedback comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;
/// MIME types accepted for guessing.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The image payload is empty.
    #[error("image is empty")]
    EmptyImage,
    /// The image payload could not be decoded.
    #[error("invalid image payload: {0}")]
    InvalidImage(String),
    /// The decoded image exceeds the size limit.
    #[error("image too large: {size} bytes (max {MAX_IMAGE_BYTES})")]
    ImageTooLarge {
        /// Decoded size in bytes.
        size: usize,
    },
    /// The MIME type is not an accepted image type.
    #[error("unsupported media type: {0}")]
    UnsupportedMimeType(String),
    /// Guess ID exceeds maximum length.
    #[error("guessId too long (max {MAX_GUESS_ID_LEN} chars)")]
    GuessIdTooLong,
    /// Guess ID is empty or contains invalid characters.
    #[error("guessId contains invalid characters")]
    GuessIdInvalidChars,
    /// Feedback comment exceeds maximum length.
    #[error("feedback too long (max {MAX_COMMENT_CHARS} chars)")]
    CommentTooLong,
}

impl ValidationError {
    /// Label used for the validation failure metric.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyImage | Self::InvalidImage(_) => "image",
            Self::ImageTooLarge { .. } => "image_size",
            Self::UnsupportedMimeType(_) => "mime_type",
            Self::GuessIdTooLong | Self::GuessIdInvalidChars => "guess_id",
            Self::CommentTooLong => "comment",
        }
    }
}

/// Check if a character is valid for IDs (ASCII alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a decoded image payload's size.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyImage`] for an empty payload and
/// [`ValidationError::ImageTooLarge`] above [`MAX_IMAGE_BYTES`].
pub fn validate_image_size(size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::EmptyImage);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge { size });
    }
    Ok(())
}

/// Validate and normalize an image MIME type.
///
/// Parameters such as `; charset=...` are dropped and `image/jpg` is
/// normalized to `image/jpeg`.
///
/// # Errors
///
/// Returns [`ValidationError::UnsupportedMimeType`] for anything outside
/// [`ALLOWED_MIME_TYPES`].
pub fn validate_mime_type(mime: &str) -> Result<&'static str, ValidationError> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    ImageFormat::from_mime(essence)
        .mime_type()
        .filter(|m| ALLOWED_MIME_TYPES.contains(m))
        .ok_or_else(|| ValidationError::UnsupportedMimeType(mime.trim().to_string()))
}

/// Validate a guess ID echoed back by the client.
///
/// Valid guess IDs:
/// - 1-64 characters
/// - ASCII alphanumeric, hyphen, underscore only (UUIDs are valid)
///
/// # Errors
///
/// Returns [`ValidationError::GuessIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::GuessIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_guess_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_GUESS_ID_LEN {
        return Err(ValidationError::GuessIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::GuessIdInvalidChars);
    }
    Ok(())
}

/// Validate a free-text feedback comment.
///
/// # Errors
///
/// Returns [`ValidationError::CommentTooLong`] above [`MAX_COMMENT_CHARS`].
pub fn validate_comment(comment: &str) -> Result<(), ValidationError> {
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(ValidationError::CommentTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_guess_ids() {
        assert!(validate_guess_id("abc").is_ok());
        assert!(validate_guess_id("3f2504e0-4f89-11d3-9a0c-0305e82c3301").is_ok());
        assert!(validate_guess_id("guess_42").is_ok());
        assert!(validate_guess_id(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_invalid_guess_ids() {
        assert_eq!(
            validate_guess_id(""),
            Err(ValidationError::GuessIdInvalidChars)
        );
        assert_eq!(
            validate_guess_id("has space"),
            Err(ValidationError::GuessIdInvalidChars)
        );
        assert_eq!(
            validate_guess_id("../etc/passwd"),
            Err(ValidationError::GuessIdInvalidChars)
        );
        assert_eq!(
            validate_guess_id("ünïcode"),
            Err(ValidationError::GuessIdInvalidChars)
        );
        assert_eq!(
            validate_guess_id(&"a".repeat(65)),
            Err(ValidationError::GuessIdTooLong)
        );
    }

    #[test]
    fn test_image_size_limits() {
        assert!(validate_image_size(1).is_ok());
        assert!(validate_image_size(MAX_IMAGE_BYTES).is_ok());
        assert_eq!(validate_image_size(0), Err(ValidationError::EmptyImage));
        assert!(matches!(
            validate_image_size(MAX_IMAGE_BYTES + 1),
            Err(ValidationError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(validate_mime_type("image/png"), Ok("image/png"));
        assert_eq!(validate_mime_type("IMAGE/JPG"), Ok("image/jpeg"));
        assert_eq!(validate_mime_type("image/webp; q=1"), Ok("image/webp"));
        assert_eq!(validate_mime_type("image/gif"), Ok("image/gif"));
        assert!(matches!(
            validate_mime_type("image/svg+xml"),
            Err(ValidationError::UnsupportedMimeType(_))
        ));
        assert!(validate_mime_type("text/html").is_err());
    }

    #[test]
    fn test_comment_length_counts_chars() {
        assert!(validate_comment(&"é".repeat(MAX_COMMENT_CHARS)).is_ok());
        assert_eq!(
            validate_comment(&"x".repeat(MAX_COMMENT_CHARS + 1)),
            Err(ValidationError::CommentTooLong)
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ValidationError::EmptyImage.kind(), "image");
        assert_eq!(ValidationError::GuessIdTooLong.kind(), "guess_id");
        assert_eq!(
            ValidationError::UnsupportedMimeType(String::new()).kind(),
            "mime_type"
        );
    }
}
