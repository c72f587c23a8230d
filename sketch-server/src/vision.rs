//! Client for an OpenAI-compatible vision endpoint.
//!
//! Sends a sketch to `POST {base}/chat/completions` as an `image_url` data
//! URI and reads back a short free-text answer. `GET {base}/models` backs
//! model listing and the reachability probe.
//!
//! The client does not enforce deadlines itself; the orchestrator races
//! every call against its own timer.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sketch_renderer::ImageFormat;
use thiserror::Error;

use crate::config::GuessConfig;

const USER_AGENT: &str = concat!("saorsa-sketch/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors from the remote vision call.
///
/// None of these reach a guess caller; the orchestrator turns each into a
/// fallback reason.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured base URL is unusable.
    #[error("invalid vision API URL: {0}")]
    InvalidUrl(String),
    /// No API key is configured.
    #[error("vision API credentials are not configured")]
    MissingCredentials,
    /// Connection, TLS, proxy or body transfer failure.
    #[error("vision API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 401/403 from the remote.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Billing or quota exhausted.
    #[error("quota exceeded: {0}")]
    Quota(String),
    /// Too many requests.
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),
    /// Any other non-success status.
    #[error("vision API returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the body, if any.
        message: String,
    },
    /// A success status whose body did not contain an answer.
    #[error("unexpected vision API response: {0}")]
    UnexpectedResponse(String),
}

impl RemoteError {
    /// Classify a non-success response.
    ///
    /// OpenAI reports an exhausted balance as a 429 with an
    /// `insufficient_quota` code, so the body is consulted before treating
    /// a 429 as plain rate limiting.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = error_message(body);
        match status.as_u16() {
            401 | 403 => Self::Auth(message),
            402 => Self::Quota(message),
            429 if body.contains("insufficient_quota") || body.contains("quota") => {
                Self::Quota(message)
            }
            429 => Self::RateLimit(message),
            code => Self::Status {
                status: code,
                message,
            },
        }
    }

    /// Whether retrying later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimit(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Pull `error.message` out of an OpenAI error body, else a trimmed excerpt.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    if let Some(message) = parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message"))
        .and_then(Value::as_str)
    {
        return message.to_string();
    }
    body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// Something that can name what a sketch depicts.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Ask the remote model what the image shows.
    async fn describe(&self, image: &[u8], mime_type: &str) -> Result<String, RemoteError>;

    /// Model identifiers the endpoint offers.
    async fn list_models(&self) -> Result<Vec<String>, RemoteError>;

    /// The model used for [`describe`](Self::describe).
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Vision backend speaking the OpenAI chat-completions protocol.
#[derive(Clone)]
pub struct OpenAiVisionClient {
    http: Client,
    config: GuessConfig,
    instruction: String,
}

impl std::fmt::Debug for OpenAiVisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAiVisionClient {
    /// Build a client from the guess configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] for an unusable proxy and
    /// [`RemoteError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &GuessConfig) -> Result<Self, RemoteError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| RemoteError::InvalidUrl(format!("proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            instruction: instruction_for(&config.response_language),
            config: config.clone(),
        })
    }

    fn api_key(&self) -> Result<&str, RemoteError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(RemoteError::MissingCredentials)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_response(status, &body))
    }
}

fn instruction_for(language: &str) -> String {
    format!(
        "You are playing a drawing guessing game. Look at the sketch and name what it \
         depicts in a few words. Reply in {language} with the answer only."
    )
}

fn image_data_uri(image: &[u8], mime_type: &str) -> String {
    let mime = match ImageFormat::from_magic_bytes(image).mime_type() {
        Some(sniffed) => sniffed,
        None if !mime_type.trim().is_empty() => mime_type.trim(),
        None => "image/png",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    format!("data:{mime};base64,{encoded}")
}

#[async_trait]
impl VisionBackend for OpenAiVisionClient {
    async fn describe(&self, image: &[u8], mime_type: &str) -> Result<String, RemoteError> {
        let key = self.api_key()?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: &self.instruction,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_uri(image, mime_type),
                        },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .find(|c| !c.is_empty())
            .ok_or_else(|| RemoteError::UnexpectedResponse("no answer in choices".to_string()))
    }

    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        let key = self.api_key()?;

        let response = self
            .http
            .get(self.config.endpoint("models"))
            .bearer_auth(key)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let list: ModelList = response.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
