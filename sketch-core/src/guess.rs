//! Guess request and result types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SketchResult;

/// Maximum number of related terms attached to a guess.
pub const MAX_SUGGESTIONS: usize = 4;

/// One encoded raster export submitted for recognition.
#[derive(Clone, PartialEq, Eq)]
pub struct GuessRequest {
    /// Encoded image bytes (no data-URI prefix).
    pub image: Vec<u8>,
    /// Declared MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl GuessRequest {
    /// Create a request from encoded bytes and their MIME type.
    #[must_use]
    pub fn new(image: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            image,
            mime_type: mime_type.into(),
        }
    }

    /// Encoded payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

impl std::fmt::Debug for GuessRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuessRequest")
            .field("bytes", &self.image.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// The answer returned for every guess, remote or synthesized.
///
/// The shape is identical either way; only `failure_reason` tells a
/// fallback apart from a remote answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResult {
    /// Identifier clients echo back when sending feedback.
    pub id: String,
    /// The guessed subject.
    pub guess: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Up to [`MAX_SUGGESTIONS`] related terms.
    pub suggestions: Vec<String>,
    /// Wall-clock time spent producing this result.
    pub processing_time_ms: u64,
    /// True for every result the orchestrator produces, fallbacks included.
    pub succeeded: bool,
    /// Why the remote answer was not used, when it was not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl GuessResult {
    /// Build a successful result, clamping confidence and trimming suggestions.
    #[must_use]
    pub fn new(guess: impl Into<String>, confidence: f32, mut suggestions: Vec<String>) -> Self {
        suggestions.truncate(MAX_SUGGESTIONS);
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            id: Uuid::new_v4().to_string(),
            guess: guess.into(),
            confidence,
            suggestions,
            processing_time_ms: 0,
            succeeded: true,
            failure_reason: None,
        }
    }

    /// Attach the elapsed processing time.
    #[must_use]
    pub fn with_processing_time(mut self, millis: u64) -> Self {
        self.processing_time_ms = millis;
        self
    }

    /// Mark this result as a fallback for the given reason.
    #[must_use]
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    /// Whether this result was synthesized instead of answered remotely.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.failure_reason.is_some()
    }

    /// Serialize to the JSON shape sent to clients.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SketchResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
