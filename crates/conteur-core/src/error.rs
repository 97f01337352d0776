// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Conteur backend.

use thiserror::Error;

/// The primary error type used across all Conteur crates.
///
/// The variants map one-to-one onto the request-level failure taxonomy:
/// bad input is rejected before any cost or ledger work, upstream failures
/// record no ledger event, store failures are surfaced or swallowed per
/// route policy, and budget denials carry a usage snapshot.
#[derive(Debug, Error)]
pub enum ConteurError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed request input, rejected before any upstream or ledger work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Key-value or relational store errors (connection, query, serialization).
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A paid upstream API call failed (chat, synthesis, or recognition).
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The daily budget denied the request. Distinct from failures: the
    /// caller gets the current usage snapshot alongside the denial.
    #[error("daily usage limit reached: ${current_usage:.2} of ${limit:.2}")]
    BudgetExceeded { current_usage: f64, limit: f64 },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
