// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the voice-chat API.
//!
//! Handles POST /api/chat, /api/speak, /api/transcribe, /api/subscribe,
//! GET /api/usage, and GET /health. Paid routes are gated by the daily
//! budget before the upstream call and billed to the ledger after it.

use std::sync::LazyLock;

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use conteur_anthropic::{ApiMessage, MessageRequest};
use conteur_core::{ConteurError, LedgerFailurePolicy, UsageEvent};
use conteur_cost::{chat_cost, recognition_cost, synthesis_cost, LimitStatus, UsageStats};
use conteur_speech::estimate_duration_secs;
use conteur_storage::subscribers;

use crate::server::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Request body for POST /api/chat and POST /api/speak.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    /// Input text.
    #[serde(default)]
    pub text: String,
}

/// Response body for POST /api/chat.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Assistant's reply text.
    pub response_text: String,
    pub success: bool,
}

/// Response body for POST /api/transcribe.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    /// Recognized text.
    pub text: String,
    pub success: bool,
}

/// Request body for POST /api/subscribe.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

/// Response body for POST /api/subscribe.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
}

/// Response body for GET /api/usage.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub success: bool,
    pub stats: UsageStats,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Budget rejection body: the error plus the limit status that caused it.
#[derive(Debug, Serialize)]
pub struct LimitExceededResponse {
    pub error: String,
    pub usage: LimitStatus,
}

/// Map a domain error to an HTTP response.
fn error_response(err: &ConteurError) -> Response {
    let status = match err {
        ConteurError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ConteurError::BudgetExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        ConteurError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(%err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Unwrap a Json extractor result, turning malformed or mistyped bodies
/// into a 400 with the standard error shape instead of axum's plain-text
/// rejection.
fn parse_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ConteurError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ConteurError::InvalidInput(rejection.body_text())),
    }
}

/// 429 response for a request rejected by the budget gate.
fn limit_response(status: LimitStatus) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(LimitExceededResponse {
            error: "Daily usage limit reached. Please try again tomorrow.".to_string(),
            usage: status,
        }),
    )
        .into_response()
}

/// Bill a usage event to the ledger, honoring the route's failure policy.
///
/// Returns an error only when the write fails AND the policy is Propagate.
async fn bill(
    state: &AppState,
    event: UsageEvent,
    date: chrono::NaiveDate,
    policy: LedgerFailurePolicy,
) -> Result<(), ConteurError> {
    match state.ledger.record_event(&event, date).await {
        Ok(_) => Ok(()),
        Err(e) => match policy {
            LedgerFailurePolicy::Propagate => Err(e),
            LedgerFailurePolicy::Swallow => {
                warn!(%e, service = %event.service(), "usage event dropped");
                Ok(())
            }
        },
    }
}

/// POST /api/chat
///
/// Sends the user's text through the chat model and returns the reply.
pub async fn post_chat(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let body = match parse_json(body) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };
    let text = body.text.trim();
    if text.is_empty() {
        return error_response(&ConteurError::InvalidInput(
            "Invalid or missing text".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let status = state.gate.check_limit(today).await;
    if !status.within_limit {
        return limit_response(status);
    }

    let request = MessageRequest {
        model: state.chat.model.clone(),
        messages: vec![ApiMessage::user(text)],
        system: Some(state.chat.system_prompt.clone()),
        max_tokens: state.chat.max_tokens,
        temperature: Some(state.chat.temperature),
    };

    let response = match state.anthropic.complete_message(&request).await {
        Ok(response) => response,
        Err(e) => return error_response(&e),
    };

    let cost = chat_cost(response.usage.input_tokens, response.usage.output_tokens);
    if let Err(e) = bill(&state, UsageEvent::Chat(cost), today, state.policies.chat).await {
        return error_response(&e);
    }

    (
        StatusCode::OK,
        Json(ChatResponse {
            response_text: response.text(),
            success: true,
        }),
    )
        .into_response()
}

/// POST /api/speak
///
/// Synthesizes the text into MP3 audio and returns it as an attachment.
pub async fn post_speak(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let body = match parse_json(body) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };
    let text = body.text.trim();
    if text.is_empty() {
        return error_response(&ConteurError::InvalidInput(
            "Invalid or missing text".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let status = state.gate.check_limit(today).await;
    if !status.within_limit {
        return limit_response(status);
    }

    let audio = match state.tts.synthesize(text).await {
        Ok(audio) => audio,
        Err(e) => return error_response(&e),
    };

    let cost = synthesis_cost(text, state.tts.voice());
    if let Err(e) = bill(
        &state,
        UsageEvent::Synthesis(cost),
        today,
        state.policies.speak,
    )
    .await
    {
        return error_response(&e);
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mp3"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"response.mp3\"",
            ),
        ],
        audio,
    )
        .into_response()
}

/// POST /api/transcribe
///
/// Accepts a multipart form with an `audio` part and returns the transcript.
pub async fn post_transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut audio: Option<Vec<u8>> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("audio") {
                    match field.bytes().await {
                        Ok(bytes) => audio = Some(bytes.to_vec()),
                        Err(e) => {
                            return error_response(&ConteurError::InvalidInput(format!(
                                "failed to read audio part: {e}"
                            )));
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(&ConteurError::InvalidInput(format!(
                    "invalid multipart body: {e}"
                )));
            }
        }
    }

    let audio = match audio {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            return error_response(&ConteurError::InvalidInput(
                "No audio file provided".to_string(),
            ));
        }
    };

    let today = Utc::now().date_naive();
    let status = state.gate.check_limit(today).await;
    if !status.within_limit {
        return limit_response(status);
    }

    let byte_len = audio.len();
    let transcription = match state.stt.transcribe(audio).await {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    let seconds = transcription
        .duration_seconds
        .unwrap_or_else(|| estimate_duration_secs(byte_len));
    let cost = recognition_cost(seconds);
    if let Err(e) = bill(
        &state,
        UsageEvent::Recognition(cost),
        today,
        state.policies.transcribe,
    )
    .await
    {
        return error_response(&e);
    }

    (
        StatusCode::OK,
        Json(TranscribeResponse {
            text: transcription.text,
            success: true,
        }),
    )
        .into_response()
}

/// POST /api/subscribe
///
/// Records an email signup. Duplicate signups are reported as success so
/// the form never leaks whether an address was already known to a retry.
pub async fn post_subscribe(
    State(state): State<AppState>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Response {
    let body = match parse_json(body) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };
    let email = body.email.trim();
    if !is_valid_email(email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(SubscribeResponse {
                success: false,
                message: "Please enter a valid email address".to_string(),
            }),
        )
            .into_response();
    }

    let normalized = email.to_lowercase();

    match subscribers::find_subscriber(&state.db, &normalized).await {
        Ok(Some(_)) => (
            StatusCode::OK,
            Json(SubscribeResponse {
                success: true,
                message: "You are already subscribed to the waiting list".to_string(),
            }),
        )
            .into_response(),
        Ok(None) => match subscribers::insert_subscriber(&state.db, &normalized).await {
            Ok(()) => (
                StatusCode::OK,
                Json(SubscribeResponse {
                    success: true,
                    message: "Thank you for subscribing! We will notify you when individual \
                              subscriptions launch."
                        .to_string(),
                }),
            )
                .into_response(),
            Err(e) => {
                error!(%e, "failed to insert subscriber");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(SubscribeResponse {
                        success: false,
                        message: "Failed to save your subscription. Please try again later."
                            .to_string(),
                    }),
                )
                    .into_response()
            }
        },
        Err(e) => {
            error!(%e, "failed to look up subscriber");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubscribeResponse {
                    success: false,
                    message: "Failed to save your subscription. Please try again later."
                        .to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/usage
///
/// Returns today's usage statistics against the daily limit.
pub async fn get_usage(State(state): State<AppState>) -> Response {
    let today = Utc::now().date_naive();
    match state.gate.usage_stats(today).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(UsageResponse {
                success: true,
                stats,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(%e, "failed to read usage stats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Validate an email address with the same shape check the signup form uses.
fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plausible_addresses() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.fr"));
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
    }

    #[test]
    fn chat_response_uses_camel_case() {
        let response = ChatResponse {
            response_text: "Il était une fois".to_string(),
            success: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["responseText"], "Il était une fois");
        assert_eq!(json["success"], true);
        assert!(json.get("response_text").is_none());
    }

    #[test]
    fn limit_exceeded_body_embeds_usage() {
        let body = LimitExceededResponse {
            error: "Daily usage limit reached. Please try again tomorrow.".to_string(),
            usage: LimitStatus {
                within_limit: false,
                current_usage: 32.0,
                limit: 1.0,
                remaining: -31.0,
                error: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["usage"]["withinLimit"], false);
        assert_eq!(json["usage"]["currentUsage"], 32.0);
        assert_eq!(json["usage"]["remaining"], -31.0);
    }

    #[test]
    fn text_request_tolerates_missing_field() {
        let body: TextRequest = serde_json::from_str("{}").unwrap();
        assert!(body.text.is_empty());
    }

    #[test]
    fn transcribe_response_shape() {
        let response = TranscribeResponse {
            text: "Bonjour".to_string(),
            success: true,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["text"], "Bonjour");
        assert_eq!(json["success"], true);
    }
}
