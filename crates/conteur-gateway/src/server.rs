// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use conteur_anthropic::AnthropicClient;
use conteur_core::{ConteurError, LedgerFailurePolicy};
use conteur_cost::{BudgetGate, UsageLedger};
use conteur_speech::{SttClient, TtsClient};
use conteur_storage::Database;

use crate::handlers;

/// Chat generation settings (mirrors AnthropicConfig from conteur-config).
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Resolved system prompt.
    pub system_prompt: String,
}

/// Per-route handling of failed ledger writes.
#[derive(Debug, Clone)]
pub struct LedgerPolicies {
    pub chat: LedgerFailurePolicy,
    pub speak: LedgerFailurePolicy,
    pub transcribe: LedgerFailurePolicy,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Daily spend ledger.
    pub ledger: Arc<UsageLedger>,
    /// Budget admission gate.
    pub gate: Arc<BudgetGate>,
    /// Database handle for signup queries.
    pub db: Database,
    /// Anthropic chat client.
    pub anthropic: AnthropicClient,
    /// Google Cloud TTS client.
    pub tts: TtsClient,
    /// Cloudflare Workers AI STT client.
    pub stt: SttClient,
    /// Chat generation settings.
    pub chat: ChatSettings,
    /// Ledger-failure policies per paid route.
    pub policies: LedgerPolicies,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors ServerConfig from conteur-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router with all API routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::post_chat))
        .route("/api/speak", post(handlers::post_speak))
        .route("/api/transcribe", post(handlers::post_transcribe))
        .route("/api/subscribe", post(handlers::post_subscribe))
        .route("/api/usage", get(handlers::get_usage))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until the process exits.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), ConteurError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConteurError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ConteurError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
