// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `serve` subcommand: wire storage, ledger, clients, and gateway.

use std::sync::Arc;

use tracing::info;

use conteur_anthropic::AnthropicClient;
use conteur_config::ConteurConfig;
use conteur_core::ConteurError;
use conteur_cost::{BudgetGate, UsageLedger};
use conteur_gateway::{start_server, AppState, ChatSettings, LedgerPolicies, ServerConfig};
use conteur_speech::{SttClient, TtsClient, VoiceSettings};
use conteur_storage::{Database, SqliteKv};

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run_serve(config: ConteurConfig) -> Result<(), ConteurError> {
    init_tracing(&config.agent.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting conteur");

    let db = Database::open(&config.storage.database_path).await?;
    let ledger = Arc::new(UsageLedger::new(Arc::new(SqliteKv::new(db.clone()))));
    let gate = Arc::new(BudgetGate::new(
        ledger.clone(),
        config.budget.daily_limit_usd,
        config.budget.fail_open,
    ));

    let anthropic_key = require(&config.anthropic.api_key, "anthropic.api_key")?;
    let anthropic = AnthropicClient::new(&anthropic_key, &config.anthropic.api_version)?;

    let tts_key = require(&config.tts.api_key, "tts.api_key")?;
    let tts = TtsClient::new(
        &tts_key,
        VoiceSettings {
            language_code: config.tts.language_code.clone(),
            voice: config.tts.voice.clone(),
            speaking_rate: config.tts.speaking_rate,
        },
    )?;

    let account_id = require(&config.stt.account_id, "stt.account_id")?;
    let api_token = require(&config.stt.api_token, "stt.api_token")?;
    let stt = SttClient::new(&account_id, &api_token, &config.stt.model)?;

    let system_prompt = config.agent.resolve_system_prompt().map_err(|e| {
        ConteurError::Config(format!("failed to read system prompt file: {e}"))
    })?;

    let state = AppState {
        ledger,
        gate,
        db: db.clone(),
        anthropic,
        tts,
        stt,
        chat: ChatSettings {
            model: config.anthropic.model.clone(),
            max_tokens: config.anthropic.max_tokens,
            temperature: config.anthropic.temperature,
            system_prompt,
        },
        policies: LedgerPolicies {
            chat: config.budget.chat_ledger_failure,
            speak: config.budget.speak_ledger_failure,
            transcribe: config.budget.transcribe_ledger_failure,
        },
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    tokio::select! {
        result = start_server(&server_config, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    db.close().await?;
    Ok(())
}

/// Fetch a required credential from config, with a pointer to the key to set.
fn require(value: &Option<String>, key: &str) -> Result<String, ConteurError> {
    value
        .clone()
        .ok_or_else(|| ConteurError::Config(format!("{key} is not set")))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("conteur={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_missing_key() {
        let err = require(&None, "anthropic.api_key").unwrap_err();
        assert!(err.to_string().contains("anthropic.api_key"));
    }

    #[test]
    fn require_returns_present_value() {
        assert_eq!(
            require(&Some("sk-test".to_string()), "anthropic.api_key").unwrap(),
            "sk-test"
        );
    }

    #[tokio::test]
    async fn serve_fails_fast_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConteurConfig::default();
        config.storage.database_path = dir
            .path()
            .join("serve.db")
            .to_string_lossy()
            .into_owned();
        let err = run_serve(config).await.unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }
}
