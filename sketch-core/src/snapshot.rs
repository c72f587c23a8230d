//! Immutable raster captures of the drawing surface.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{SketchError, SketchResult};

/// Bytes per pixel in a snapshot buffer (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

static LAST_CAPTURE: AtomicU64 = AtomicU64::new(0);

/// Get the current timestamp in milliseconds since epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Timestamps won't exceed u64 for billions of years
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Next capture timestamp, strictly greater than every one handed out before.
fn next_capture_timestamp() -> u64 {
    let now = current_timestamp();
    let previous = LAST_CAPTURE
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or(now);
    now.max(previous.saturating_add(1))
}

/// A full-surface RGBA capture at one point in the drawing history.
///
/// Pixel content is opaque to the history engine. Cloning is cheap: the
/// buffer is shared, never copied.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
    captured_at: u64,
}

impl Snapshot {
    /// Capture a surface from a raw RGBA8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SketchError::BufferSize`] if `pixels` is not exactly
    /// `width * height * 4` bytes long.
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> SketchResult<Self> {
        let pixels = pixels.into();
        let expected = Self::buffer_len(width, height);
        if pixels.len() != expected {
            return Err(SketchError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
            captured_at: next_capture_timestamp(),
        })
    }

    /// A surface filled with a single RGBA color.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels: Vec<u8> = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::buffer_len(width, height))
            .collect();

        Self {
            width,
            height,
            pixels: pixels.into(),
            captured_at: next_capture_timestamp(),
        }
    }

    /// A blank surface: opaque white, the color of an empty canvas.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self::filled(width, height, [255, 255, 255, 255])
    }

    /// Surface width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the surface has no pixels at all.
    #[must_use]
    pub const fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA8 pixel data, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Capture time in milliseconds since epoch; strictly increasing across captures.
    #[must_use]
    pub const fn captured_at(&self) -> u64 {
        self.captured_at
    }

    /// Size of the pixel buffer in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    fn buffer_len(width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(BYTES_PER_PIXEL)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
