// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Conteur workspace.
//!
//! The usage record is the wire shape persisted in the KV store and
//! returned by the usage endpoint, so field names serialize as camelCase
//! and service keys use the public service tags.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three billable upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// LLM chat completion.
    Chat,
    /// Text-to-speech synthesis.
    SpeechSynthesis,
    /// Speech-to-text recognition.
    SpeechRecognition,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ServiceKind::Chat => "chat",
            ServiceKind::SpeechSynthesis => "speech-synthesis",
            ServiceKind::SpeechRecognition => "speech-recognition",
        };
        f.write_str(tag)
    }
}

/// How a route reacts when the usage ledger fails to record an event
/// after the upstream call already succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerFailurePolicy {
    /// The request fails; the user does not receive the upstream result.
    #[default]
    Propagate,
    /// The failure is logged and the upstream result is served anyway.
    Swallow,
}

// --- Cost model outputs ---

/// Cost breakdown for one chat completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCost {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Cost breakdown for one speech synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisCost {
    pub characters: u64,
    /// Whether the neural voice tier was billed.
    pub neural: bool,
    pub total_cost: f64,
}

/// Cost breakdown for one speech recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionCost {
    pub seconds: f64,
    pub total_cost: f64,
}

/// One billable call to an upstream service, tagged by service and
/// carrying the cost-model output for that call.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageEvent {
    Chat(ChatCost),
    Synthesis(SynthesisCost),
    Recognition(RecognitionCost),
}

impl UsageEvent {
    /// The service this event bills against.
    pub fn service(&self) -> ServiceKind {
        match self {
            UsageEvent::Chat(_) => ServiceKind::Chat,
            UsageEvent::Synthesis(_) => ServiceKind::SpeechSynthesis,
            UsageEvent::Recognition(_) => ServiceKind::SpeechRecognition,
        }
    }

    /// The event's total cost in USD.
    pub fn total_cost(&self) -> f64 {
        match self {
            UsageEvent::Chat(c) => c.total_cost,
            UsageEvent::Synthesis(c) => c.total_cost,
            UsageEvent::Recognition(c) => c.total_cost,
        }
    }
}

// --- Usage record (per-day aggregate) ---

/// Chat accumulator within a day's usage record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUsage {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

/// Speech synthesis accumulator within a day's usage record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisUsage {
    pub calls: u64,
    pub characters: u64,
    pub cost: f64,
}

/// Speech recognition accumulator within a day's usage record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionUsage {
    pub calls: u64,
    pub seconds: f64,
    pub cost: f64,
}

/// Per-service accumulators. All three services are always present so the
/// persisted JSON shape is identical on a day with zero prior events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBreakdown {
    pub chat: ChatUsage,
    #[serde(rename = "speech-synthesis")]
    pub synthesis: SynthesisUsage,
    #[serde(rename = "speech-recognition")]
    pub recognition: RecognitionUsage,
}

/// The per-day aggregate of usage events and derived cost.
///
/// One record exists per calendar day, created lazily on the first usage
/// event of the day and overwritten wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Calendar day the record covers (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Sum of the three per-service `cost` fields.
    pub total_cost: f64,
    /// Per-service accumulators.
    pub services: ServiceBreakdown,
}

impl UsageRecord {
    /// A zero-valued record for the given day, all three services populated.
    pub fn zeroed(date: NaiveDate) -> Self {
        Self {
            date,
            total_cost: 0.0,
            services: ServiceBreakdown::default(),
        }
    }

    /// Fold one usage event into the matching service's accumulators and
    /// recompute the day total.
    pub fn apply(&mut self, event: &UsageEvent) {
        match event {
            UsageEvent::Chat(c) => {
                let s = &mut self.services.chat;
                s.calls += 1;
                s.input_tokens += c.input_tokens;
                s.output_tokens += c.output_tokens;
                s.cost += c.total_cost;
            }
            UsageEvent::Synthesis(c) => {
                let s = &mut self.services.synthesis;
                s.calls += 1;
                s.characters += c.characters;
                s.cost += c.total_cost;
            }
            UsageEvent::Recognition(c) => {
                let s = &mut self.services.recognition;
                s.calls += 1;
                s.seconds += c.seconds;
                s.cost += c.total_cost;
            }
        }
        self.recompute_total();
    }

    /// Recompute `total_cost` as the sum of the three per-service costs.
    ///
    /// Recomputed from scratch rather than incremented so the invariant
    /// cannot drift from the per-service fields.
    fn recompute_total(&mut self) {
        self.total_cost = self.services.chat.cost
            + self.services.synthesis.cost
            + self.services.recognition.cost;
    }
}
