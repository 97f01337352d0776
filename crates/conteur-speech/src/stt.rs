// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloudflare Workers AI speech-to-text client.
//!
//! Posts raw audio bytes to the Whisper model endpoint. Recognition is
//! billed per second of audio; when the API reports word timings the
//! duration comes from the last word's end time, otherwise callers fall
//! back to [`estimate_duration_secs`].

use std::time::Duration;

use conteur_core::ConteurError;
use serde::Deserialize;
use tracing::debug;

/// Nominal bitrate of browser MediaRecorder audio, used to estimate clip
/// duration when the API returns no word timings.
const RECORDER_BITRATE_BPS: f64 = 128_000.0;

/// A transcription result.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Recognized text.
    pub text: String,
    /// Clip duration derived from word timings, if the API reported any.
    pub duration_seconds: Option<f64>,
}

/// HTTP client for Cloudflare Workers AI speech recognition.
#[derive(Debug, Clone)]
pub struct SttClient {
    client: reqwest::Client,
    api_token: String,
    run_url: String,
}

#[derive(Deserialize)]
struct RunResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<WhisperResult>,
    #[serde(default)]
    errors: Vec<RunError>,
}

#[derive(Deserialize)]
struct WhisperResult {
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Deserialize)]
struct WhisperWord {
    #[serde(default)]
    end: f64,
}

#[derive(Deserialize)]
struct RunError {
    #[serde(default)]
    message: String,
}

impl SttClient {
    /// Creates a new STT client for the given Cloudflare account and model.
    pub fn new(account_id: &str, api_token: &str, model: &str) -> Result<Self, ConteurError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ConteurError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_token: api_token.to_string(),
            run_url: format!(
                "https://api.cloudflare.com/client/v4/accounts/{account_id}/ai/run/{model}"
            ),
        })
    }

    /// Overrides the run URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_run_url(mut self, url: String) -> Self {
        self.run_url = url;
        self
    }

    /// Transcribe raw audio bytes.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<Transcription, ConteurError> {
        let response = self
            .client
            .post(&self.run_url)
            .bearer_auth(&self.api_token)
            .header("content-type", "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| ConteurError::Upstream {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "recognition response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConteurError::Upstream {
                message: format!("STT API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: RunResponse = response.json().await.map_err(|e| ConteurError::Upstream {
            message: format!("failed to parse STT response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !parsed.success {
            let detail = parsed
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ConteurError::Upstream {
                message: format!("STT API reported failure: {detail}"),
                source: None,
            });
        }

        let result = parsed.result.ok_or_else(|| ConteurError::Upstream {
            message: "STT API returned success without a result".to_string(),
            source: None,
        })?;

        let duration_seconds = result
            .words
            .last()
            .map(|w| w.end)
            .filter(|end| end.is_finite() && *end > 0.0);

        Ok(Transcription {
            text: result.text,
            duration_seconds,
        })
    }
}

/// Estimate clip duration in seconds from its compressed byte length.
pub fn estimate_duration_secs(byte_len: usize) -> f64 {
    (byte_len as f64 * 8.0) / RECORDER_BITRATE_BPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn transcribe_returns_text_and_duration_from_words() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer cf-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": {
                    "text": "Il était une fois",
                    "word_count": 4,
                    "words": [
                        {"word": "Il", "start": 0.0, "end": 0.4},
                        {"word": "était", "start": 0.4, "end": 0.9},
                        {"word": "une", "start": 0.9, "end": 1.2},
                        {"word": "fois", "start": 1.2, "end": 1.8}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SttClient::new("acc", "cf-token", "@cf/openai/whisper")
            .unwrap()
            .with_run_url(server.uri());

        let transcription = client.transcribe(vec![0u8; 1024]).await.unwrap();
        assert_eq!(transcription.text, "Il était une fois");
        assert_eq!(transcription.duration_seconds, Some(1.8));
    }

    #[tokio::test]
    async fn missing_words_yields_no_duration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": {"text": "Bonjour"}
            })))
            .mount(&server)
            .await;

        let client = SttClient::new("acc", "t", "@cf/openai/whisper")
            .unwrap()
            .with_run_url(server.uri());

        let transcription = client.transcribe(vec![0u8; 64]).await.unwrap();
        assert_eq!(transcription.text, "Bonjour");
        assert_eq!(transcription.duration_seconds, None);
    }

    #[tokio::test]
    async fn api_failure_envelope_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "errors": [{"code": 7009, "message": "model not found"}]
            })))
            .mount(&server)
            .await;

        let client = SttClient::new("acc", "t", "@cf/openai/whisper")
            .unwrap()
            .with_run_url(server.uri());

        let err = client.transcribe(vec![0u8; 64]).await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[tokio::test]
    async fn http_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = SttClient::new("acc", "bad", "@cf/openai/whisper")
            .unwrap()
            .with_run_url(server.uri());

        let err = client.transcribe(vec![0u8; 64]).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn duration_estimate_scales_with_byte_length() {
        // 16 kB at 128 kbps is one second of audio.
        assert!((estimate_duration_secs(16_000) - 1.0).abs() < 1e-9);
        assert_eq!(estimate_duration_secs(0), 0.0);
    }
}
