// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budget gate: admission control in front of every paid upstream call.
//!
//! The gate compares the day's accumulated cost against the configured
//! daily limit. Admission uses strict `<`: a call that would land exactly
//! on the limit is still admitted; only usage already at or above the
//! ceiling blocks.
//!
//! When the ledger cannot be read the gate applies the configured
//! fail-open policy. Fail-open (the default) admits the call and attaches
//! the error, trading strict enforcement for continuity during a store
//! outage. Fail-closed denies instead.

use std::sync::Arc;

use chrono::NaiveDate;
use conteur_core::{ConteurError, UsageRecord};
use serde::Serialize;
use tracing::warn;

use crate::ledger::UsageLedger;

/// Result of a budget check, returned to routes and surfaced to callers
/// on a 429 denial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    /// Whether the next call is admitted.
    pub within_limit: bool,
    /// Today's accumulated cost (0 when no record exists yet).
    pub current_usage: f64,
    /// The configured daily ceiling.
    pub limit: f64,
    /// `limit - current_usage`; negative once over budget.
    pub remaining: f64,
    /// Ledger read error, when the gate answered under the fail policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Today's usage record enriched with limit-derived fields, as served by
/// the usage endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(flatten)]
    pub record: UsageRecord,
    pub limit: f64,
    pub remaining: f64,
    pub percent_used: f64,
}

/// Admission control over the usage ledger.
pub struct BudgetGate {
    ledger: Arc<UsageLedger>,
    daily_limit_usd: f64,
    fail_open: bool,
}

impl BudgetGate {
    /// Create a gate with the given daily ceiling and store-outage policy.
    pub fn new(ledger: Arc<UsageLedger>, daily_limit_usd: f64, fail_open: bool) -> Self {
        Self {
            ledger,
            daily_limit_usd,
            fail_open,
        }
    }

    /// Check whether the budget admits another paid call on `date`.
    ///
    /// Never fails: a ledger read error is folded into the status under
    /// the fail-open/fail-closed policy.
    pub async fn check_limit(&self, date: NaiveDate) -> LimitStatus {
        let limit = self.daily_limit_usd;
        match self.ledger.stats_for(date).await {
            Ok(record) => {
                let current = record.total_cost;
                LimitStatus {
                    within_limit: current < limit,
                    current_usage: current,
                    limit,
                    remaining: limit - current,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    fail_open = self.fail_open,
                    "budget check could not read ledger"
                );
                LimitStatus {
                    within_limit: self.fail_open,
                    current_usage: 0.0,
                    limit,
                    remaining: limit,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// The day's usage record with limit, remaining, and percent used.
    pub async fn usage_stats(&self, date: NaiveDate) -> Result<UsageStats, ConteurError> {
        let record = self.ledger.stats_for(date).await?;
        let limit = self.daily_limit_usd;
        let percent_used = if limit > 0.0 {
            (record.total_cost / limit) * 100.0
        } else {
            0.0
        };
        Ok(UsageStats {
            remaining: limit - record.total_cost,
            percent_used,
            limit,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::synthesis_cost;
    use crate::testing::{FailingKv, MemoryKv};
    use conteur_core::UsageEvent;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn gate_over(store: Arc<UsageLedger>, limit: f64, fail_open: bool) -> BudgetGate {
        BudgetGate::new(store, limit, fail_open)
    }

    async fn ledger_with_cost(cost: f64) -> Arc<UsageLedger> {
        let ledger = Arc::new(UsageLedger::new(Arc::new(MemoryKv::default())));
        if cost > 0.0 {
            // One synthesis event with a synthetic cost to seed the total.
            let mut c = synthesis_cost("x", "fr-FR-Standard-A");
            c.total_cost = cost;
            ledger
                .record_event(&UsageEvent::Synthesis(c), day())
                .await
                .unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn zero_usage_is_within_limit() {
        let gate = gate_over(ledger_with_cost(0.0).await, 20.0, true);
        let status = gate.check_limit(day()).await;
        assert!(status.within_limit);
        assert_eq!(status.current_usage, 0.0);
        assert_eq!(status.limit, 20.0);
        assert_eq!(status.remaining, 20.0);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn usage_exactly_at_limit_blocks() {
        let gate = gate_over(ledger_with_cost(20.0).await, 20.0, true);
        let status = gate.check_limit(day()).await;
        assert!(!status.within_limit, "at-limit usage must block");
        assert!((status.remaining - 0.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn usage_one_cent_under_limit_admits() {
        let gate = gate_over(ledger_with_cost(19.99).await, 20.0, true);
        let status = gate.check_limit(day()).await;
        assert!(status.within_limit);
    }

    #[tokio::test]
    async fn over_budget_reports_negative_remaining() {
        // $1 limit against one 2M-character neural synthesis ($32.00).
        let ledger = Arc::new(UsageLedger::new(Arc::new(MemoryKv::default())));
        let text = "a".repeat(2_000_000);
        ledger
            .record_event(
                &UsageEvent::Synthesis(synthesis_cost(&text, "fr-FR-Neural2-A")),
                day(),
            )
            .await
            .unwrap();

        let gate = gate_over(ledger, 1.0, true);
        let status = gate.check_limit(day()).await;
        assert!(!status.within_limit);
        assert!((status.current_usage - 32.00).abs() < 1e-9);
        assert!((status.remaining - -31.00).abs() < 1e-9);
    }

    #[tokio::test]
    async fn store_outage_fails_open_with_error_attached() {
        let ledger = Arc::new(UsageLedger::new(Arc::new(FailingKv)));
        let gate = gate_over(ledger, 20.0, true);
        let status = gate.check_limit(day()).await;
        assert!(status.within_limit);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn store_outage_fails_closed_when_configured() {
        let ledger = Arc::new(UsageLedger::new(Arc::new(FailingKv)));
        let gate = gate_over(ledger, 20.0, false);
        let status = gate.check_limit(day()).await;
        assert!(!status.within_limit);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn usage_stats_enriches_record_with_percent() {
        let gate = gate_over(ledger_with_cost(5.0).await, 20.0, true);
        let stats = gate.usage_stats(day()).await.unwrap();
        assert!((stats.percent_used - 25.0).abs() < 1e-9);
        assert!((stats.remaining - 15.0).abs() < 1e-9);

        let json = serde_json::to_value(&stats).unwrap();
        // Record fields are flattened alongside the derived fields.
        assert_eq!(json["date"], "2026-03-01");
        assert_eq!(json["limit"], 20.0);
        assert!(json["services"]["chat"].is_object());
        assert_eq!(json["percentUsed"], 25.0);
    }

    #[tokio::test]
    async fn usage_stats_propagates_store_errors() {
        let ledger = Arc::new(UsageLedger::new(Arc::new(FailingKv)));
        let gate = gate_over(ledger, 20.0, true);
        assert!(gate.usage_stats(day()).await.is_err());
    }

    #[test]
    fn limit_status_omits_error_when_absent() {
        let status = LimitStatus {
            within_limit: true,
            current_usage: 0.0,
            limit: 20.0,
            remaining: 20.0,
            error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["withinLimit"], true);
        assert_eq!(json["currentUsage"], 0.0);
    }
}
