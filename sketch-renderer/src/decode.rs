//! Image sniffing, data-URI parsing and snapshot decoding.
//!
//! Browsers send canvas exports as `data:image/png;base64,iVBOR...`. The
//! guess pipeline wants raw bytes plus a MIME type, so the prefix is
//! stripped here.

use base64::Engine;
use sketch_core::Snapshot;

use crate::error::{RenderError, RenderResult};

/// Image formats recognized by their MIME type or magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF.
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// Canonical MIME type, if the format is known.
    #[must_use]
    pub const fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::WebP => Some("image/webp"),
            Self::Gif => Some("image/gif"),
            Self::Unknown => None,
        }
    }

    /// Whether this is a recognized image format.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Raw bytes recovered from a data URI or bare base64 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDataUri {
    /// Declared MIME type, or the sniffed one when none was declared.
    pub mime_type: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Strip an optional `data:<mime>;base64,` prefix and decode the payload.
///
/// A bare base64 string is accepted too; its MIME type is sniffed from the
/// magic bytes (`application/octet-stream` when unrecognized).
///
/// # Errors
///
/// Returns [`RenderError::Decode`] for malformed URIs, non-base64 data URIs
/// and invalid base64.
pub fn parse_data_uri(input: &str) -> RenderResult<DecodedDataUri> {
    let input = input.trim();

    let (declared_mime, encoded) = if let Some(rest) = input.strip_prefix("data:") {
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| RenderError::Decode("invalid data URI: missing comma".to_string()))?;

        if !metadata.contains(";base64") {
            return Err(RenderError::Decode(
                "only base64 data URIs are supported".to_string(),
            ));
        }

        let mime = metadata.split(';').next().unwrap_or_default().trim();
        (Some(mime).filter(|m| !m.is_empty()), payload)
    } else {
        (None, input)
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| RenderError::Decode(format!("invalid base64: {e}")))?;

    let mime_type = match declared_mime {
        Some(mime) => mime.to_ascii_lowercase(),
        None => ImageFormat::from_magic_bytes(&bytes)
            .mime_type()
            .unwrap_or("application/octet-stream")
            .to_string(),
    };

    Ok(DecodedDataUri { mime_type, bytes })
}

/// Decode an encoded image into a snapshot.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] if the bytes are not a decodable image.
pub fn load_snapshot(data: &[u8]) -> RenderResult<Snapshot> {
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Decode(format!("failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Snapshot::new(width, height, rgba.into_raw()).map_err(|e| RenderError::Decode(e.to_string()))
}
