//! Player feedback on a guess.

use serde::{Deserialize, Serialize};

use crate::current_timestamp;

/// Whether a guess was right, plus an optional free-text comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessFeedback {
    /// The `id` of the [`GuessResult`](crate::GuessResult) being rated.
    pub guess_id: String,
    /// Whether the player says the guess was correct.
    pub is_correct: bool,
    /// Optional comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// When the feedback was given (ms since epoch).
    #[serde(default = "current_timestamp")]
    pub timestamp: u64,
}

impl GuessFeedback {
    /// Feedback stamped with the current time.
    #[must_use]
    pub fn new(guess_id: impl Into<String>, is_correct: bool, feedback: Option<String>) -> Self {
        Self {
            guess_id: guess_id.into(),
            is_correct,
            feedback,
            timestamp: current_timestamp(),
        }
    }
}
