// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API client for Conteur chat turns.
//!
//! Each chat turn is a single stateless request: one user message plus the
//! configured system prompt. The caller is responsible for billing the
//! returned token usage against the daily ledger.

pub mod client;
pub mod types;

pub use client::AnthropicClient;
pub use types::{ApiMessage, ApiUsage, MessageRequest, MessageResponse};
