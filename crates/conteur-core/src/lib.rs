// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Conteur backend.
//!
//! Provides the shared error type, the usage-tracking domain types, and
//! the key-value store trait implemented by the storage crate.

pub mod error;
pub mod kv;
pub mod types;

pub use error::ConteurError;
pub use kv::KvStore;
pub use types::{
    ChatCost, ChatUsage, LedgerFailurePolicy, RecognitionCost, RecognitionUsage,
    ServiceBreakdown, ServiceKind, SynthesisCost, SynthesisUsage, UsageEvent, UsageRecord,
};
