// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static price table and cost calculation for the three upstream services.
//!
//! Chat:        input $3.00/MTok, output $15.00/MTok
//! Synthesis:   $4.00/M characters standard, $16.00/M characters neural
//! Recognition: $0.00033 per second of audio
//!
//! All three functions are pure and total: they never fail, and missing
//! quantities are the caller's zero. Negative inputs are not validated
//! here; callers own input sanity.

use conteur_core::{ChatCost, RecognitionCost, SynthesisCost};

/// USD per million chat input tokens.
pub const CHAT_INPUT_PER_MTOK: f64 = 3.00;
/// USD per million chat output tokens.
pub const CHAT_OUTPUT_PER_MTOK: f64 = 15.00;
/// USD per million synthesized characters, standard voice tier.
pub const SYNTHESIS_STANDARD_PER_MCHAR: f64 = 4.00;
/// USD per million synthesized characters, neural voice tier.
pub const SYNTHESIS_NEURAL_PER_MCHAR: f64 = 16.00;
/// USD per second of recognized audio.
pub const RECOGNITION_PER_SECOND: f64 = 0.00033;

const MILLION: f64 = 1_000_000.0;

/// Cost of one chat completion given its token counts.
pub fn chat_cost(input_tokens: u64, output_tokens: u64) -> ChatCost {
    let input_cost = (input_tokens as f64 / MILLION) * CHAT_INPUT_PER_MTOK;
    let output_cost = (output_tokens as f64 / MILLION) * CHAT_OUTPUT_PER_MTOK;
    ChatCost {
        input_tokens,
        output_tokens,
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
    }
}

/// Cost of synthesizing `text` with the given voice.
///
/// The neural tier is selected when the voice name indicates a neural
/// voice (e.g. "fr-FR-Neural2-A"); anything else bills at the standard
/// rate. The billed quantity is the character count of the input text.
pub fn synthesis_cost(text: &str, voice: &str) -> SynthesisCost {
    let characters = text.chars().count() as u64;
    let neural = voice.contains("Neural");
    let rate = if neural {
        SYNTHESIS_NEURAL_PER_MCHAR
    } else {
        SYNTHESIS_STANDARD_PER_MCHAR
    };
    SynthesisCost {
        characters,
        neural,
        total_cost: (characters as f64 / MILLION) * rate,
    }
}

/// Cost of recognizing `seconds` of audio.
pub fn recognition_cost(seconds: f64) -> RecognitionCost {
    RecognitionCost {
        seconds,
        total_cost: seconds * RECOGNITION_PER_SECOND,
    }
}
