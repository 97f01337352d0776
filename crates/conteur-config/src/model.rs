// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Conteur backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use conteur_core::LedgerFailurePolicy;
use serde::{Deserialize, Serialize};

/// Persona prompt used when neither `agent.system_prompt` nor
/// `agent.system_prompt_file` is set.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant with a passion for creative \
    writing and storytelling. Your task is to collaborate with users to create engaging \
    stories, offering imaginative plot twists and dynamic character development. Encourage \
    the user to contribute their ideas and build upon them to create a captivating narrative.";

/// Top-level Conteur configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; API credentials are the only thing a deployment must supply.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConteurConfig {
    /// HTTP server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and persona settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Daily budget and ledger-failure policies.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Anthropic chat API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Google Cloud Text-to-Speech settings.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Cloudflare Workers AI speech-to-text settings.
    #[serde(default)]
    pub stt: SttConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

/// Logging and persona configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

impl AgentConfig {
    /// Resolve the effective system prompt: file > inline > built-in default.
    pub fn resolve_system_prompt(&self) -> std::io::Result<String> {
        if let Some(path) = &self.system_prompt_file {
            return std::fs::read_to_string(path);
        }
        Ok(self
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Daily budget and per-route ledger-failure policies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Daily spending ceiling in USD across all three services.
    #[serde(default = "default_daily_limit")]
    pub daily_limit_usd: f64,

    /// When the ledger cannot be read, admit (`true`) or deny (`false`)
    /// paid calls. Fail-open trades strict enforcement for continuity.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,

    /// What a failed ledger write does to a chat response.
    #[serde(default)]
    pub chat_ledger_failure: LedgerFailurePolicy,

    /// What a failed ledger write does to a synthesis response.
    #[serde(default)]
    pub speak_ledger_failure: LedgerFailurePolicy,

    /// What a failed ledger write does to a transcription response.
    /// Defaults to swallow: a finished transcript is served even if the
    /// cheapest service's usage event cannot be recorded.
    #[serde(default = "default_swallow")]
    pub transcribe_ledger_failure: LedgerFailurePolicy,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit_usd: default_daily_limit(),
            fail_open: default_fail_open(),
            chat_ledger_failure: LedgerFailurePolicy::Propagate,
            speak_ledger_failure: LedgerFailurePolicy::Propagate,
            transcribe_ledger_failure: default_swallow(),
        }
    }
}

fn default_daily_limit() -> f64 {
    20.00
}

fn default_fail_open() -> bool {
    true
}

fn default_swallow() -> LedgerFailurePolicy {
    LedgerFailurePolicy::Swallow
}

/// Anthropic chat API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for chat completions.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_temperature() -> f32 {
    1.0
}

/// Google Cloud Text-to-Speech configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// GCP API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// BCP-47 language code for synthesis.
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Voice name. Names containing "Neural" bill at the neural tier.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Speaking rate multiplier.
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language_code: default_language_code(),
            voice: default_voice(),
            speaking_rate: default_speaking_rate(),
        }
    }
}

fn default_language_code() -> String {
    "fr-FR".to_string()
}

fn default_voice() -> String {
    "fr-FR-Neural2-A".to_string()
}

fn default_speaking_rate() -> f64 {
    1.0
}

/// Cloudflare Workers AI speech-to-text configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SttConfig {
    /// Cloudflare account ID.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Workers AI API token.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Whisper model identifier.
    #[serde(default = "default_stt_model")]
    pub model: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            api_token: None,
            model: default_stt_model(),
        }
    }
}

fn default_stt_model() -> String {
    "@cf/openai/whisper".to_string()
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "conteur.db".to_string()
}
