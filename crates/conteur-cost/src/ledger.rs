// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger: durable accumulation of per-day, per-service usage cost.
//!
//! The ledger keeps one JSON record per calendar day in the key-value
//! store under `usage_<YYYY-MM-DD>`. Every update is a whole-record
//! read-modify-write with no cross-writer coordination: two overlapping
//! updates can lose one increment (last writer wins). That race is an
//! accepted simplification; the ledger is an approximate spend meter,
//! not an exact bill.
//!
//! The current date is always an explicit parameter so the ledger never
//! reads a clock and stays timezone-deterministic under test.

use std::sync::Arc;

use chrono::NaiveDate;
use conteur_core::{ConteurError, KvStore, UsageEvent, UsageRecord};
use tracing::{error, info};

/// KV key for a day's usage record.
pub fn usage_key(date: NaiveDate) -> String {
    format!("usage_{}", date.format("%Y-%m-%d"))
}

/// Per-day usage ledger over an external key-value store.
pub struct UsageLedger {
    store: Arc<dyn KvStore>,
}

impl UsageLedger {
    /// Create a ledger over the given key-value store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Record one usage event against the given day and return the
    /// updated record.
    ///
    /// Reads the day's record (synthesizing a zeroed one when absent),
    /// folds in the event, recomputes the day total from the per-service
    /// costs, and writes the whole record back unconditionally. Store
    /// failures are logged and re-raised; callers decide per route
    /// whether that aborts the user-facing response.
    pub async fn record_event(
        &self,
        event: &UsageEvent,
        date: NaiveDate,
    ) -> Result<UsageRecord, ConteurError> {
        let mut record = self.load(date).await.inspect_err(|e| {
            error!(error = %e, date = %date, "usage ledger read failed");
        })?;

        record.apply(event);

        let key = usage_key(date);
        let json = serde_json::to_string(&record).map_err(|e| ConteurError::Store {
            source: Box::new(e),
        })?;
        self.store.put(&key, &json).await.inspect_err(|e| {
            error!(error = %e, key = %key, "usage ledger write failed");
        })?;

        info!(
            service = %event.service(),
            cost_usd = event.total_cost(),
            day_total_usd = record.total_cost,
            "usage recorded"
        );

        Ok(record)
    }

    /// The given day's record, or a zeroed default when no usage has
    /// been recorded yet. Only fails when the store itself fails.
    pub async fn stats_for(&self, date: NaiveDate) -> Result<UsageRecord, ConteurError> {
        self.load(date).await
    }

    /// Read-or-synthesize the record for a day.
    async fn load(&self, date: NaiveDate) -> Result<UsageRecord, ConteurError> {
        match self.store.get(&usage_key(date)).await? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| ConteurError::Store {
                    source: Box::new(e),
                })
            }
            None => Ok(UsageRecord::zeroed(date)),
        }
    }
}
