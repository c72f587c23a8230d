//! Where guess feedback goes.

use async_trait::async_trait;
use sketch_core::GuessFeedback;
use thiserror::Error;

/// Forwarding feedback failed. Logged by the orchestrator, never surfaced.
#[derive(Debug, Error)]
pub enum FeedbackDeliveryError {
    /// The sink could not accept the record.
    #[error("feedback sink unavailable: {0}")]
    Unavailable(String),
    /// The sink did not answer within the delivery deadline.
    #[error("feedback delivery timed out after {0} ms")]
    TimedOut(u64),
}

/// Destination for user feedback on guesses.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Forward one feedback record.
    async fn deliver(&self, feedback: &GuessFeedback) -> Result<(), FeedbackDeliveryError>;
}

/// Writes feedback as structured log records under `sketch::feedback`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedbackSink;

#[async_trait]
impl FeedbackSink for TracingFeedbackSink {
    async fn deliver(&self, feedback: &GuessFeedback) -> Result<(), FeedbackDeliveryError> {
        tracing::info!(
            target: "sketch::feedback",
            guess_id = %feedback.guess_id,
            is_correct = feedback.is_correct,
            comment = feedback.feedback.as_deref().unwrap_or(""),
            timestamp = feedback.timestamp,
            "Guess feedback"
        );
        Ok(())
    }
}
