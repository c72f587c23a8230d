//! Server and guess configuration.
//!
//! Every option can come from the command line or the environment. The
//! resulting [`GuessConfig`] is immutable: changing credentials means
//! building a new orchestrator.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use clap::Parser;
use sketch_core::{ServiceMode, DEFAULT_HISTORY_CAPACITY};
use thiserror::Error;
use url::Url;

/// Default port for the sketch server.
pub const DEFAULT_PORT: u16 = 9474;
/// Default vision API base URL (OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// [`DEFAULT_BASE_URL`] parsed once. The literal is a fixed absolute https
/// URL, so parsing cannot fail at runtime; `test_default_base_url_parses`
/// pins that.
static PARSED_DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid absolute URL")
});
/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default deadline for server-side recognition.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Default cap on the remote answer length.
pub const DEFAULT_MAX_TOKENS: u32 = 100;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default language the remote model answers in.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL option could not be parsed.
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl {
        /// Option name.
        field: &'static str,
        /// Parser message.
        reason: String,
    },
    /// A URL option uses a scheme other than http/https.
    #[error("{field} URL must use http or https, got {scheme}")]
    UnsupportedScheme {
        /// Option name.
        field: &'static str,
        /// Offending scheme.
        scheme: String,
    },
    /// Temperature outside `[0, 2]`.
    #[error("temperature must be within [0, 2], got {0}")]
    Temperature(f32),
    /// `max_tokens` was zero.
    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,
    /// The remote timeout was zero.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Command-line arguments for the sketch server.
#[derive(Debug, Clone, Parser)]
#[command(name = "saorsa-sketch")]
#[command(about = "Draw-and-guess server backed by a remote vision model")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on (localhost only)
    #[arg(long, env = "SKETCH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Initial service mode: online or offline
    #[arg(long, env = "SKETCH_MODE", default_value = "online")]
    pub mode: ServiceMode,

    /// Undo history capacity advertised to clients
    #[arg(long, env = "HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Vision API base URL (OpenAI-compatible)
    #[arg(long, env = "VISION_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Vision API key
    #[arg(long, env = "VISION_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Vision model identifier
    #[arg(long, env = "VISION_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Remote recognition deadline in milliseconds
    #[arg(long, env = "VISION_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Maximum output tokens for the remote answer
    #[arg(long, env = "VISION_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(long, env = "VISION_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// HTTP or HTTPS proxy for outbound vision calls
    #[arg(long, env = "VISION_PROXY_URL")]
    pub proxy: Option<String>,

    /// Language the model should answer in
    #[arg(long, env = "GUESS_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Minimum apparent latency of fallback guesses in milliseconds (0 disables)
    #[arg(long, env = "FALLBACK_MIN_LATENCY_MS", default_value_t = 800)]
    pub fallback_min_latency_ms: u64,

    /// Random extra latency added to fallback guesses in milliseconds
    #[arg(long, env = "FALLBACK_JITTER_MS", default_value_t = 700)]
    pub fallback_jitter_ms: u64,
}

/// Artificial latency applied to fallback guesses so they are not
/// distinguishable from network answers by timing alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackLatency {
    /// Minimum total processing time.
    pub min: Duration,
    /// Upper bound of the uniform random extra delay.
    pub jitter: Duration,
}

impl FallbackLatency {
    /// No artificial delay.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Whether any delay is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.min.is_zero() || !self.jitter.is_zero()
    }
}

impl Default for FallbackLatency {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(800),
            jitter: Duration::from_millis(700),
        }
    }
}

/// Immutable configuration for the guess orchestrator.
#[derive(Clone)]
pub struct GuessConfig {
    /// Vision API base URL; `/chat/completions` and `/models` are appended.
    pub base_url: Url,
    /// API credential. `None` makes every remote attempt fall back.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Deadline for the remote call.
    pub timeout: Duration,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional outbound proxy.
    pub proxy: Option<Url>,
    /// Language the model answers in.
    pub response_language: String,
    /// Deadline for the reachability probe.
    pub health_timeout: Duration,
    /// Deadline for forwarding feedback.
    pub feedback_timeout: Duration,
    /// Artificial fallback latency.
    pub fallback_latency: FallbackLatency,
}

impl GuessConfig {
    /// Check ranges and URL schemes.
    ///
    /// # Errors
    ///
    /// Returns the first invalid option found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_http("base", &self.base_url)?;
        if let Some(proxy) = &self.proxy {
            require_http("proxy", proxy)?;
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Whether an API credential is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Build `{base_url}/{path}` without dropping any base path segment.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for GuessConfig {
    fn default() -> Self {
        Self {
            base_url: PARSED_DEFAULT_BASE_URL.clone(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            proxy: None,
            response_language: DEFAULT_LANGUAGE.to_string(),
            health_timeout: Duration::from_secs(5),
            feedback_timeout: Duration::from_secs(2),
            fallback_latency: FallbackLatency::default(),
        }
    }
}

impl fmt::Debug for GuessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuessConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("proxy", &self.proxy.as_ref().map(Url::as_str))
            .field("response_language", &self.response_language)
            .field("fallback_latency", &self.fallback_latency)
            .finish_non_exhaustive()
    }
}

/// Settings for the HTTP server itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind on localhost.
    pub port: u16,
    /// Service mode at startup.
    pub initial_mode: ServiceMode,
    /// Undo history capacity advertised to clients.
    pub history_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            initial_mode: ServiceMode::Online,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Orchestrator settings.
    pub guess: GuessConfig,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let base_url = parse_url("base", &args.base_url)?;
        let proxy = args
            .proxy
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| parse_url("proxy", p))
            .transpose()?;

        let guess = GuessConfig {
            base_url,
            api_key: args.api_key.filter(|k| !k.trim().is_empty()),
            model: args.model,
            timeout: Duration::from_millis(args.timeout_ms),
            max_tokens: args.max_tokens,
            temperature: args.temperature,
            proxy,
            response_language: args.language,
            fallback_latency: FallbackLatency {
                min: Duration::from_millis(args.fallback_min_latency_ms),
                jitter: Duration::from_millis(args.fallback_jitter_ms),
            },
            ..GuessConfig::default()
        };
        guess.validate()?;

        Ok(Self {
            server: ServerConfig {
                port: args.port,
                initial_mode: args.mode,
                history_capacity: args.history_capacity.max(1),
            },
            guess,
        })
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}

fn require_http(field: &'static str, url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme {
            field,
            scheme: other.to_string(),
        }),
    }
}
