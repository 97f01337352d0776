// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost tracking and budget enforcement for the Conteur backend.
//!
//! This crate provides:
//! - **Pricing**: static per-service price table and pure cost functions
//! - **Usage ledger**: per-day read-modify-write accumulation in a KV store
//! - **Budget gate**: daily-limit admission control with a configurable
//!   fail-open policy on store outages

pub mod budget;
pub mod ledger;
pub mod pricing;

#[cfg(test)]
pub(crate) mod testing;

pub use budget::{BudgetGate, LimitStatus, UsageStats};
pub use ledger::{usage_key, UsageLedger};
pub use pricing::{chat_cost, recognition_cost, synthesis_cost};
