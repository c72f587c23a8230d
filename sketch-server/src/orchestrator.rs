//! Guess orchestration: remote vision call raced against a deadline, with
//! a heuristic fallback on any failure.
//!
//! ```text
//!   guess(image, mime)
//!        │
//!        ├── offline ───────────────────────────────┐
//!        │                                          ▼
//!        └── online ── spawn describe() ──┬── ok ── remote result
//!                      sleep(timeout) ────┴── err / timeout ── fallback
//! ```
//!
//! The first branch of the race to finish decides the result. A remote
//! call that loses to the timer, or whose caller goes away, is aborted and
//! its answer is never seen. Only fallbacks decided without network I/O
//! are padded to the latency floor.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use sketch_core::{GuessFeedback, GuessRequest, GuessResult, ServiceMode, SharedServiceMode};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::GuessConfig;
use crate::fallback::{FallbackGenerator, FallbackReason};
use crate::feedback::{FeedbackDeliveryError, FeedbackSink, TracingFeedbackSink};
use crate::metrics;
use crate::suggest::{confidence_from_response, suggestions_for};
use crate::vision::{OpenAiVisionClient, RemoteError, VisionBackend};

/// Produces a guess for every sketch, remote or not.
pub struct GuessOrchestrator {
    config: GuessConfig,
    backend: Arc<dyn VisionBackend>,
    fallback: FallbackGenerator,
    feedback: Arc<dyn FeedbackSink>,
    mode: SharedServiceMode,
}

impl std::fmt::Debug for GuessOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuessOrchestrator")
            .field("config", &self.config)
            .field("model", &self.backend.model_name())
            .field("mode", &self.mode.get())
            .finish_non_exhaustive()
    }
}

impl GuessOrchestrator {
    /// Orchestrator backed by the OpenAI-compatible client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn new(config: GuessConfig) -> Result<Self, RemoteError> {
        let client = OpenAiVisionClient::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(client)))
    }

    /// Orchestrator with an explicit vision backend.
    #[must_use]
    pub fn with_backend(config: GuessConfig, backend: Arc<dyn VisionBackend>) -> Self {
        Self {
            fallback: FallbackGenerator::new(config.fallback_latency),
            backend,
            feedback: Arc::new(TracingFeedbackSink),
            mode: SharedServiceMode::default(),
            config,
        }
    }

    /// Use a specific random source for fallback selection.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.fallback = FallbackGenerator::with_rng(rng, self.config.fallback_latency);
        self
    }

    /// Forward feedback to `sink` instead of the log.
    #[must_use]
    pub fn with_feedback_sink(mut self, sink: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = sink;
        self
    }

    /// Share a mode switch with other components.
    #[must_use]
    pub fn with_mode(mut self, mode: SharedServiceMode) -> Self {
        self.mode = mode;
        self
    }

    /// The configuration this orchestrator was built with.
    #[must_use]
    pub const fn config(&self) -> &GuessConfig {
        &self.config
    }

    /// Current service mode.
    #[must_use]
    pub fn mode(&self) -> ServiceMode {
        self.mode.get()
    }

    /// Switch between online and offline. Returns the previous mode.
    ///
    /// Requests already in flight keep whichever mode they started with.
    pub fn set_mode(&self, mode: ServiceMode) -> ServiceMode {
        let previous = self.mode.set(mode);
        metrics::set_service_mode(mode);
        previous
    }

    /// Guess what the sketch depicts. Never fails.
    ///
    /// Offline, or on any remote failure or timeout, the result comes from
    /// the fallback pools and carries a `failure_reason`.
    #[tracing::instrument(
        name = "guess",
        skip(self, request),
        fields(bytes = request.len(), mime = %request.mime_type)
    )]
    pub async fn guess(&self, request: GuessRequest) -> GuessResult {
        let started = Instant::now();
        let GuessRequest { image, mime_type } = request;
        let image: Arc<[u8]> = image.into();

        let outcome = match self.mode.get() {
            ServiceMode::Offline => Err(FallbackReason::Offline),
            ServiceMode::Online => self.race_remote(Arc::clone(&image), mime_type).await,
        };

        match outcome {
            Ok(answer) => {
                let elapsed = started.elapsed();
                let result = GuessResult::new(
                    answer.as_str(),
                    confidence_from_response(&answer),
                    suggestions_for(&answer),
                )
                .with_processing_time(millis(elapsed));

                metrics::record_guess("remote", "none", elapsed);
                tracing::info!(
                    guess_id = %result.id,
                    guess = %result.guess,
                    elapsed_ms = result.processing_time_ms,
                    "Remote guess"
                );
                result
            }
            Err(reason) => {
                let result = self.fallback.synthesize(&image, &reason);
                if reason.is_local() {
                    self.fallback.pad_latency(started).await;
                }
                let elapsed = started.elapsed();
                let result = result.with_processing_time(millis(elapsed));

                metrics::record_guess("fallback", reason.label(), elapsed);
                if reason == FallbackReason::Offline {
                    tracing::debug!(guess_id = %result.id, "Offline guess");
                } else {
                    tracing::warn!(
                        guess_id = %result.id,
                        reason = %reason,
                        elapsed_ms = result.processing_time_ms,
                        "Remote guess failed, using fallback"
                    );
                }
                result
            }
        }
    }

    /// Run the remote call against the deadline. Only the winning branch
    /// produces a value.
    async fn race_remote(
        &self,
        image: Arc<[u8]>,
        mime_type: String,
    ) -> Result<String, FallbackReason> {
        let backend = Arc::clone(&self.backend);
        let mut task =
            AbortOnDrop(tokio::spawn(async move { backend.describe(&image, &mime_type).await }));
        let deadline = tokio::time::sleep(self.config.timeout);

        tokio::select! {
            joined = &mut task.0 => match joined {
                Ok(Ok(answer)) => normalize_answer(&answer)
                    .ok_or_else(|| FallbackReason::Remote("empty answer".to_string())),
                Ok(Err(err)) => {
                    tracing::debug!(error = %err, retryable = err.is_retryable(), "Remote call failed");
                    Err(FallbackReason::from(&err))
                }
                Err(err) => {
                    tracing::error!(error = %err, "Remote task did not complete");
                    Err(FallbackReason::TaskFailed)
                }
            },
            () = deadline => Err(FallbackReason::Timeout(self.config.timeout)),
        }
    }

    /// Whether the remote endpoint answers within the health deadline.
    /// Never fails; any error reads as unreachable.
    #[tracing::instrument(name = "check_health", skip(self))]
    pub async fn check_health(&self) -> bool {
        match tokio::time::timeout(self.config.health_timeout, self.backend.list_models()).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "Vision endpoint unhealthy");
                false
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = millis(self.config.health_timeout),
                    "Vision health check timed out"
                );
                false
            }
        }
    }

    /// Models the endpoint offers, or just the configured model when the
    /// listing is unavailable.
    #[tracing::instrument(name = "list_supported_models", skip(self))]
    pub async fn list_supported_models(&self) -> Vec<String> {
        let listed = match tokio::time::timeout(self.config.timeout, self.backend.list_models())
            .await
        {
            Ok(Ok(models)) => models,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Model listing failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("Model listing timed out");
                Vec::new()
            }
        };

        if listed.is_empty() {
            vec![self.backend.model_name().to_string()]
        } else {
            listed
        }
    }

    /// Record feedback on a guess. Returns whether it was delivered;
    /// delivery failures are logged and otherwise ignored.
    pub async fn submit_feedback(
        &self,
        guess_id: &str,
        is_correct: bool,
        comment: Option<String>,
    ) -> bool {
        self.deliver_feedback(GuessFeedback::new(guess_id, is_correct, comment))
            .await
    }

    /// Forward a complete feedback record, bounded by the feedback deadline.
    #[tracing::instrument(
        name = "submit_feedback",
        skip(self, feedback),
        fields(guess_id = %feedback.guess_id, is_correct = feedback.is_correct)
    )]
    pub async fn deliver_feedback(&self, feedback: GuessFeedback) -> bool {
        let limit = self.config.feedback_timeout;
        let outcome = match tokio::time::timeout(limit, self.feedback.deliver(&feedback)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FeedbackDeliveryError::TimedOut(millis(limit))),
        };

        let delivered = match outcome {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "Feedback not delivered");
                false
            }
        };
        metrics::record_feedback(delivered);
        delivered
    }
}

/// Aborts the remote task when dropped, whether the timer won or the
/// caller stopped waiting.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn normalize_answer(answer: &str) -> Option<String> {
    let trimmed = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim_end_matches('.')
        .trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
