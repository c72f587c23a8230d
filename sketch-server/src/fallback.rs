//! Heuristic guesses produced without the remote model.
//!
//! A candidate is drawn at random from one of three pools chosen by the
//! encoded image size. Randomness comes from an injectable [`StdRng`] so
//! tests can seed it and assert pool membership.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sketch_core::GuessResult;
use sketch_renderer::ImageFormat;
use tokio::time::Instant;

use crate::config::FallbackLatency;
use crate::suggest::suggestions_for;
use crate::vision::RemoteError;

/// Images at least this large are treated as detailed scenes.
pub const COMPLEX_MIN_BYTES: usize = 200_000;
/// Images smaller than this are treated as simple icons.
pub const SIMPLE_MAX_BYTES: usize = 20_000;

/// Confidence when the payload carries a recognizable image signature.
pub const KNOWN_FORMAT_CONFIDENCE: f32 = 0.35;
/// Confidence for payloads with no recognizable signature.
pub const UNKNOWN_FORMAT_CONFIDENCE: f32 = 0.25;

const COMPLEX_POOL: &[&str] = &[
    "a detailed landscape",
    "a city skyline",
    "a busy street scene",
    "a portrait",
    "a garden full of flowers",
    "a mountain range at sunset",
];

const SIMPLE_POOL: &[&str] = &[
    "a circle",
    "a star",
    "a heart",
    "a smiley face",
    "a stick figure",
    "an arrow",
];

const EVERYDAY_POOL: &[&str] = &[
    "a cat",
    "a tree",
    "a car",
    "a flower",
    "a house",
    "the sun",
    "a fish",
    "a bicycle",
];

/// Why a guess came from the fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The service is in offline mode.
    Offline,
    /// No API key is configured.
    MissingCredentials,
    /// The remote call missed its deadline.
    Timeout(Duration),
    /// The remote rejected the request for rate limiting.
    RateLimit,
    /// The remote account is out of quota.
    Quota,
    /// The remote rejected the credentials.
    Auth,
    /// Network or connection failure.
    Transport(String),
    /// Any other remote failure.
    Remote(String),
    /// The remote task panicked or was cancelled.
    TaskFailed,
}

impl FallbackReason {
    /// Short, stable label for metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::MissingCredentials => "missing_credentials",
            Self::Timeout(_) => "timeout",
            Self::RateLimit => "rate_limit",
            Self::Quota => "quota",
            Self::Auth => "auth",
            Self::Transport(_) => "transport",
            Self::Remote(_) => "remote",
            Self::TaskFailed => "task_failed",
        }
    }

    /// Whether the fallback was decided without any network I/O. Only these
    /// results are padded to the latency floor.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Offline | Self::MissingCredentials)
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("service is offline"),
            Self::MissingCredentials => f.write_str("vision API key not configured"),
            Self::Timeout(after) => write!(f, "timeout after {} ms", after.as_millis()),
            Self::RateLimit => f.write_str("rate limit exceeded"),
            Self::Quota => f.write_str("quota exceeded"),
            Self::Auth => f.write_str("authentication failed"),
            Self::Transport(detail) => write!(f, "network error: {detail}"),
            Self::Remote(detail) => write!(f, "remote error: {detail}"),
            Self::TaskFailed => f.write_str("remote task failed"),
        }
    }
}

impl From<&RemoteError> for FallbackReason {
    fn from(err: &RemoteError) -> Self {
        match err {
            RemoteError::MissingCredentials => Self::MissingCredentials,
            RemoteError::RateLimit(_) => Self::RateLimit,
            RemoteError::Quota(_) => Self::Quota,
            RemoteError::Auth(_) => Self::Auth,
            RemoteError::Transport(e) => Self::Transport(e.to_string()),
            other => Self::Remote(other.to_string()),
        }
    }
}

/// Candidate pool selected by encoded image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPool {
    /// Large payloads.
    Complex,
    /// Small payloads.
    Simple,
    /// Everything in between.
    Everyday,
}

impl FallbackPool {
    /// Pool for an image of `len` bytes.
    #[must_use]
    pub const fn for_size(len: usize) -> Self {
        if len >= COMPLEX_MIN_BYTES {
            Self::Complex
        } else if len < SIMPLE_MAX_BYTES {
            Self::Simple
        } else {
            Self::Everyday
        }
    }

    /// The phrases this pool draws from.
    #[must_use]
    pub const fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Complex => COMPLEX_POOL,
            Self::Simple => SIMPLE_POOL,
            Self::Everyday => EVERYDAY_POOL,
        }
    }

    /// Whether any pool contains `guess`.
    #[must_use]
    pub fn contains_any(guess: &str) -> bool {
        [Self::Complex, Self::Simple, Self::Everyday]
            .iter()
            .any(|pool| pool.candidates().contains(&guess))
    }
}

/// Produces fallback guesses and pads their apparent latency.
#[derive(Debug)]
pub struct FallbackGenerator {
    rng: Mutex<StdRng>,
    latency: FallbackLatency,
}

impl FallbackGenerator {
    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn new(latency: FallbackLatency) -> Self {
        Self::with_rng(StdRng::from_entropy(), latency)
    }

    /// Generator with an explicit random source.
    #[must_use]
    pub fn with_rng(rng: StdRng, latency: FallbackLatency) -> Self {
        Self {
            rng: Mutex::new(rng),
            latency,
        }
    }

    /// Configured latency floor.
    #[must_use]
    pub const fn latency(&self) -> FallbackLatency {
        self.latency
    }

    /// Build a fallback result for `image`. Timing is left to the caller.
    #[must_use]
    pub fn synthesize(&self, image: &[u8], reason: &FallbackReason) -> GuessResult {
        let pool = FallbackPool::for_size(image.len());
        let guess = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pool.candidates()
                .choose(&mut *rng)
                .copied()
                .unwrap_or("a drawing")
        };

        let confidence = if ImageFormat::from_magic_bytes(image).is_known() {
            KNOWN_FORMAT_CONFIDENCE
        } else {
            UNKNOWN_FORMAT_CONFIDENCE
        };

        tracing::debug!(?pool, guess, %reason, "Synthesized fallback guess");

        GuessResult::new(guess, confidence, suggestions_for(guess))
            .with_failure_reason(reason.to_string())
    }

    /// Sleep until at least the latency floor plus a random jitter has
    /// passed since `started`.
    pub async fn pad_latency(&self, started: Instant) {
        if !self.latency.is_enabled() {
            return;
        }
        let target = self.latency.min + self.jitter();
        let elapsed = started.elapsed();
        if elapsed < target {
            tokio::time::sleep(target - elapsed).await;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn jitter(&self) -> Duration {
        let max = self.latency.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.gen_range(0..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

    fn seeded(latency: FallbackLatency) -> FallbackGenerator {
        FallbackGenerator::with_rng(StdRng::seed_from_u64(7), latency)
    }

    fn png_of_len(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[..4].copy_from_slice(&PNG_MAGIC);
        bytes
    }

    #[test]
    fn test_only_offline_reasons_are_local() {
        assert!(FallbackReason::Offline.is_local());
        assert!(FallbackReason::MissingCredentials.is_local());
        assert!(!FallbackReason::Timeout(Duration::from_millis(200)).is_local());
        assert!(!FallbackReason::RateLimit.is_local());
        assert!(!FallbackReason::Transport("reset".into()).is_local());
        assert!(!FallbackReason::TaskFailed.is_local());
    }

    #[test]
    fn test_pool_boundaries() {
        assert_eq!(FallbackPool::for_size(0), FallbackPool::Simple);
        assert_eq!(FallbackPool::for_size(19_999), FallbackPool::Simple);
        assert_eq!(FallbackPool::for_size(20_000), FallbackPool::Everyday);
        assert_eq!(FallbackPool::for_size(199_999), FallbackPool::Everyday);
        assert_eq!(FallbackPool::for_size(200_000), FallbackPool::Complex);
    }

    #[test]
    fn test_guess_drawn_from_size_pool() {
        let generator = seeded(FallbackLatency::none());
        for (len, pool) in [
            (100, FallbackPool::Simple),
            (50_000, FallbackPool::Everyday),
            (250_000, FallbackPool::Complex),
        ] {
            for _ in 0..20 {
                let result = generator.synthesize(&png_of_len(len), &FallbackReason::Offline);
                assert!(pool.candidates().contains(&result.guess.as_str()));
            }
        }
    }

    #[test]
    fn test_confidence_tiers() {
        let generator = seeded(FallbackLatency::none());
        let known = generator.synthesize(&png_of_len(64), &FallbackReason::Offline);
        let unknown = generator.synthesize(&[0u8; 64], &FallbackReason::Offline);
        assert!((known.confidence - KNOWN_FORMAT_CONFIDENCE).abs() < f32::EPSILON);
        assert!((unknown.confidence - UNKNOWN_FORMAT_CONFIDENCE).abs() < f32::EPSILON);
        assert!(known.confidence > unknown.confidence);
    }

    #[test]
    fn test_result_carries_reason() {
        let generator = seeded(FallbackLatency::none());
        let result = generator.synthesize(&png_of_len(64), &FallbackReason::RateLimit);
        assert!(result.succeeded);
        assert_eq!(result.failure_reason.as_deref(), Some("rate limit exceeded"));
        assert!(result.suggestions.len() <= sketch_core::MAX_SUGGESTIONS);
    }

    #[test]
    fn test_reason_from_remote_error() {
        assert_eq!(
            FallbackReason::from(&RemoteError::RateLimit("slow".into())),
            FallbackReason::RateLimit
        );
        assert_eq!(
            FallbackReason::from(&RemoteError::MissingCredentials),
            FallbackReason::MissingCredentials
        );
        assert!(matches!(
            FallbackReason::from(&RemoteError::Status {
                status: 500,
                message: "boom".into()
            }),
            FallbackReason::Remote(_)
        ));
    }

    #[test]
    fn test_timeout_reason_mentions_timeout() {
        let reason = FallbackReason::Timeout(Duration::from_millis(1500));
        assert_eq!(reason.to_string(), "timeout after 1500 ms");
        assert_eq!(reason.label(), "timeout");
    }

    #[test]
    fn test_same_seed_same_guess() {
        let a = seeded(FallbackLatency::none()).synthesize(&[1u8; 30_000], &FallbackReason::Offline);
        let b = seeded(FallbackLatency::none()).synthesize(&[1u8; 30_000], &FallbackReason::Offline);
        assert_eq!(a.guess, b.guess);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_floor_is_applied() {
        let latency = FallbackLatency {
            min: Duration::from_millis(800),
            jitter: Duration::from_millis(700),
        };
        let generator = seeded(latency);
        let started = Instant::now();
        generator.pad_latency(started).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed <= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_latency_returns_immediately() {
        let generator = seeded(FallbackLatency::none());
        let started = Instant::now();
        generator.pad_latency(started).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
