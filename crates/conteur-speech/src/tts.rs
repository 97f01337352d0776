// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Cloud Text-to-Speech client.
//!
//! Wraps the `text:synthesize` REST endpoint. Input text is escaped and
//! wrapped in SSML before submission; the base64 `audioContent` in the
//! response is decoded into raw MP3 bytes.

use std::time::Duration;

use base64::Engine;
use conteur_core::ConteurError;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Base URL for the Google Cloud TTS synthesize endpoint.
const API_BASE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Voice selection and delivery settings for synthesis.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    /// BCP-47 language code (e.g., "fr-FR").
    pub language_code: String,
    /// Voice name (e.g., "fr-FR-Neural2-A").
    pub voice: String,
    /// Speaking rate multiplier.
    pub speaking_rate: f64,
}

/// HTTP client for Google Cloud Text-to-Speech.
#[derive(Debug, Clone)]
pub struct TtsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    settings: VoiceSettings,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

impl TtsClient {
    /// Creates a new TTS client with the given API key and voice settings.
    pub fn new(api_key: &str, settings: VoiceSettings) -> Result<Self, ConteurError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ConteurError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: API_BASE_URL.to_string(),
            settings,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// The configured voice name. Names containing "Neural" bill at the
    /// neural tier.
    pub fn voice(&self) -> &str {
        &self.settings.voice
    }

    /// Synthesize `text` into MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ConteurError> {
        let ssml = text_to_ssml(text);
        let body = json!({
            "input": { "ssml": ssml },
            "voice": {
                "languageCode": self.settings.language_code,
                "name": self.settings.voice,
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": self.settings.speaking_rate,
            },
        });

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ConteurError::Upstream {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, voice = %self.settings.voice, "synthesis response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConteurError::Upstream {
                message: format!("TTS API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SynthesizeResponse =
            response.json().await.map_err(|e| ConteurError::Upstream {
                message: format!("failed to parse TTS response: {e}"),
                source: Some(Box::new(e)),
            })?;

        base64::engine::general_purpose::STANDARD
            .decode(&parsed.audio_content)
            .map_err(|e| ConteurError::Upstream {
                message: format!("TTS returned invalid base64 audio: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

/// Escape XML special characters and wrap the text in a `<speak>` element.
pub fn text_to_ssml(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;");
    format!("<speak>{escaped}</speak>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_settings() -> VoiceSettings {
        VoiceSettings {
            language_code: "fr-FR".to_string(),
            voice: "fr-FR-Neural2-A".to_string(),
            speaking_rate: 1.0,
        }
    }

    #[test]
    fn ssml_escapes_special_characters() {
        assert_eq!(
            text_to_ssml(r#"Tom & Jerry disent <"bonjour">"#),
            "<speak>Tom &amp; Jerry disent &lt;&quot;bonjour&quot;&gt;</speak>"
        );
    }

    #[test]
    fn ssml_escapes_apostrophes() {
        assert_eq!(
            text_to_ssml("l'histoire"),
            "<speak>l&apos;histoire</speak>"
        );
    }

    #[test]
    fn plain_text_is_wrapped_unchanged() {
        assert_eq!(text_to_ssml("Bonjour"), "<speak>Bonjour</speak>");
    }

    #[tokio::test]
    async fn synthesize_decodes_audio_content() {
        let mp3_bytes = b"ID3fake-mp3-payload";
        let encoded = base64::engine::general_purpose::STANDARD.encode(mp3_bytes);

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "gcp-test-key"))
            .and(body_partial_json(serde_json::json!({
                "voice": {"languageCode": "fr-FR", "name": "fr-FR-Neural2-A"},
                "audioConfig": {"audioEncoding": "MP3"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"audioContent": encoded})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TtsClient::new("gcp-test-key", make_settings())
            .unwrap()
            .with_base_url(server.uri());

        let audio = client.synthesize("Bonjour").await.unwrap();
        assert_eq!(audio, mp3_bytes);
    }

    #[tokio::test]
    async fn synthesize_sends_ssml_input() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"x");
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "input": {"ssml": "<speak>l&apos;aventure</speak>"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"audioContent": encoded})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = TtsClient::new("k", make_settings())
            .unwrap()
            .with_base_url(server.uri());
        client.synthesize("l'aventure").await.unwrap();
    }

    #[tokio::test]
    async fn error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
            .mount(&server)
            .await;

        let client = TtsClient::new("bad-key", make_settings())
            .unwrap()
            .with_base_url(server.uri());

        let err = client.synthesize("Bonjour").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn invalid_base64_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"audioContent": "!!!not-base64!!!"})),
            )
            .mount(&server)
            .await;

        let client = TtsClient::new("k", make_settings())
            .unwrap()
            .with_base_url(server.uri());

        assert!(client.synthesize("Bonjour").await.is_err());
    }
}
