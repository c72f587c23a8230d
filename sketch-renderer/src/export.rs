//! Snapshot export to encoded image formats.
//!
//! Encodes a [`Snapshot`] to PNG (lossless) or JPEG (lossy, quality in
//! `[0, 1]`) with the `image` crate. Export never touches history.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine;
use image::ImageEncoder;
use sketch_core::Snapshot;

use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    Jpeg,
}

impl RasterFormat {
    /// MIME type for this format.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Whether encoding discards information.
    #[must_use]
    pub const fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for RasterFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(Self::Png),
            "jpg" | "jpeg" | "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Configuration for snapshot export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Background that transparent pixels are composited onto for JPEG.
    pub background: [u8; 4],
    /// Quality used when a caller passes a non-finite value.
    pub default_quality: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            default_quality: 0.92,
        }
    }
}

/// Encodes snapshots to image bytes.
#[derive(Debug, Clone, Default)]
pub struct RasterExporter {
    config: ExportConfig,
}

impl RasterExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Get the exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Encode a snapshot.
    ///
    /// `quality` only affects lossy formats; it is clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptySurface`] for zero-area snapshots and
    /// [`RenderError::Encoding`] if the encoder fails.
    pub fn export(
        &self,
        snapshot: &Snapshot,
        format: RasterFormat,
        quality: f32,
    ) -> RenderResult<Vec<u8>> {
        if snapshot.is_zero_area() {
            return Err(RenderError::EmptySurface {
                width: snapshot.width(),
                height: snapshot.height(),
            });
        }

        let bytes = match format {
            RasterFormat::Png => Self::render_to_png(snapshot)?,
            RasterFormat::Jpeg => self.render_to_jpeg(snapshot, self.jpeg_quality(quality))?,
        };

        tracing::debug!(
            format = %format,
            width = snapshot.width(),
            height = snapshot.height(),
            bytes = bytes.len(),
            "Exported snapshot"
        );
        Ok(bytes)
    }

    fn render_to_png(snapshot: &Snapshot) -> RenderResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(
                snapshot.pixels(),
                snapshot.width(),
                snapshot.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| RenderError::Encoding(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render_to_jpeg(&self, snapshot: &Snapshot, quality: u8) -> RenderResult<Vec<u8>> {
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity(snapshot.byte_len() / 4 * 3);
        for pixel in snapshot.pixels().chunks_exact(4) {
            let alpha = f32::from(pixel[3]) / 255.0;
            let inv = 1.0 - alpha;
            rgb_data.push((f32::from(pixel[0]).mul_add(alpha, f32::from(bg[0]) * inv)) as u8);
            rgb_data.push((f32::from(pixel[1]).mul_add(alpha, f32::from(bg[1]) * inv)) as u8);
            rgb_data.push((f32::from(pixel[2]).mul_add(alpha, f32::from(bg[2]) * inv)) as u8);
        }

        let mut buf = Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
            .write_image(
                &rgb_data,
                snapshot.width(),
                snapshot.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| RenderError::Encoding(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Map `[0, 1]` quality onto the encoder's 1..=100 scale.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn jpeg_quality(&self, quality: f32) -> u8 {
        let quality = if quality.is_finite() {
            quality
        } else {
            self.config.default_quality
        };
        ((quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
    }
}

/// Wrap encoded bytes in a `data:` URI for the browser.
#[must_use]
pub fn to_data_uri(bytes: &[u8], format: RasterFormat) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{encoded}", format.mime_type())
}
