// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway exposing the Conteur voice-chat API.
//!
//! Routes:
//! - POST /api/chat -- chat completion
//! - POST /api/speak -- text-to-speech (MP3 attachment)
//! - POST /api/transcribe -- speech-to-text (multipart `audio` part)
//! - POST /api/subscribe -- email signup
//! - GET /api/usage -- today's spend against the daily limit
//! - GET /health -- liveness probe

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, AppState, ChatSettings, LedgerPolicies, ServerConfig};
