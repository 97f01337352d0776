// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech and speech-to-text clients for Conteur.
//!
//! Synthesis goes through Google Cloud Text-to-Speech and is billed per
//! character; recognition goes through Cloudflare Workers AI Whisper and is
//! billed per second of audio.

pub mod stt;
pub mod tts;

pub use stt::{estimate_duration_secs, SttClient, Transcription};
pub use tts::{text_to_ssml, TtsClient, VoiceSettings};
