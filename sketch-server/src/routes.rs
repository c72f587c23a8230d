//! API route handlers.
//!
//! Every response uses one envelope:
//! `{success: true, data, timestamp}` or
//! `{success: false, error: {code, message}, timestamp}`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sketch_core::{current_timestamp, GuessFeedback, GuessRequest, GuessResult, ServiceMode};
use sketch_renderer::parse_data_uri;

use crate::metrics;
use crate::validation::{self, ValidationError};
use crate::AppState;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Payload.
    pub data: T,
    /// Server time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` in a success envelope.
    #[must_use]
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            timestamp: current_timestamp(),
        })
    }
}

/// Error rendered as the failure envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Build an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": { "code": self.code, "message": self.message },
            "timestamp": current_timestamp(),
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        metrics::record_validation_failure(err.kind());
        let code = match err {
            ValidationError::EmptyImage | ValidationError::InvalidImage(_) => "INVALID_IMAGE",
            ValidationError::ImageTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ValidationError::UnsupportedMimeType(_) => "UNSUPPORTED_MEDIA_TYPE",
            _ => "INVALID_REQUEST",
        };
        Self::new(StatusCode::BAD_REQUEST, code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let code = match status {
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            _ => "INVALID_REQUEST",
        };
        metrics::record_validation_failure("body");
        Self::new(status, code, rejection.body_text())
    }
}

/// Body of `POST /api/guess`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessBody {
    /// Data URI or bare base64 image.
    pub image: String,
    /// Overrides the MIME type declared in the data URI.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Body of `PUT /api/mode`.
#[derive(Debug, Deserialize)]
pub struct ModeBody {
    /// Requested mode.
    pub mode: ServiceMode,
}

/// Mode payload.
#[derive(Debug, Serialize)]
pub struct ModeData {
    /// Mode now in effect.
    pub mode: ServiceMode,
    /// Mode before the change, for `PUT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ServiceMode>,
}

/// Client-facing settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigData {
    /// Undo history capacity the canvas should use.
    pub history_capacity: usize,
    /// Model used for guesses.
    pub model: String,
    /// Server-side recognition deadline.
    pub timeout_ms: u64,
    /// Current service mode.
    pub mode: ServiceMode,
}

/// Guess what a sketch depicts.
#[tracing::instrument(name = "guess_handler", skip(state, payload))]
pub async fn guess_handler(
    State(state): State<AppState>,
    payload: Result<Json<GuessBody>, JsonRejection>,
) -> Result<Json<ApiResponse<GuessResult>>, ApiError> {
    let Json(body) = payload?;

    let decoded = parse_data_uri(&body.image)
        .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;
    validation::validate_image_size(decoded.bytes.len())?;

    let declared = body.mime_type.as_deref().unwrap_or(&decoded.mime_type);
    let mime_type = validation::validate_mime_type(declared)?;

    let result = state
        .orchestrator
        .guess(GuessRequest::new(decoded.bytes, mime_type))
        .await;
    Ok(ApiResponse::ok(result))
}

/// Accept feedback on a previous guess. Delivery is best effort.
#[tracing::instrument(name = "feedback_handler", skip(state, payload))]
pub async fn feedback_handler(
    State(state): State<AppState>,
    payload: Result<Json<GuessFeedback>, JsonRejection>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let Json(feedback) = payload?;

    validation::validate_guess_id(&feedback.guess_id)?;
    if let Some(comment) = &feedback.feedback {
        validation::validate_comment(comment)?;
    }

    let accepted = state.orchestrator.deliver_feedback(feedback).await;
    Ok(ApiResponse::ok(json!({ "accepted": accepted })))
}

/// Current service mode.
pub async fn get_mode_handler(State(state): State<AppState>) -> Json<ApiResponse<ModeData>> {
    ApiResponse::ok(ModeData {
        mode: state.orchestrator.mode(),
        previous: None,
    })
}

/// Switch the service mode.
#[tracing::instrument(name = "set_mode_handler", skip(state, payload))]
pub async fn set_mode_handler(
    State(state): State<AppState>,
    payload: Result<Json<ModeBody>, JsonRejection>,
) -> Result<Json<ApiResponse<ModeData>>, ApiError> {
    let Json(body) = payload?;
    let previous = state.orchestrator.set_mode(body.mode);
    Ok(ApiResponse::ok(ModeData {
        mode: body.mode,
        previous: Some(previous),
    }))
}

/// Models offered by the vision endpoint.
pub async fn models_handler(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    let models = state.orchestrator.list_supported_models().await;
    ApiResponse::ok(json!({
        "models": models,
        "default": state.orchestrator.config().model,
    }))
}

/// Settings the browser client needs.
pub async fn config_handler(State(state): State<AppState>) -> Json<ApiResponse<ClientConfigData>> {
    let config = state.orchestrator.config();
    ApiResponse::ok(ClientConfigData {
        history_capacity: state.history_capacity,
        model: config.model.clone(),
        timeout_ms: u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
        mode: state.orchestrator.mode(),
    })
}
