// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics rendered with miette.
//!
//! Figment deserialization failures become structured diagnostics: an
//! unknown key gets a source span into the TOML file that contains it
//! plus a "did you mean" suggestion from Jaro-Winkler similarity.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
/// 0.75 catches `vocie` -> `voice` and `daily_limt_usd` ->
/// `daily_limit_usd` without suggesting unrelated keys.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for an Elm-style report.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no config section accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(conteur::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, when one is similar enough.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(conteur::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A semantic constraint violated by an otherwise well-formed value.
    #[error("validation error: {message}")]
    #[diagnostic(code(conteur::config::validation))]
    Validation { message: String },

    /// Any other loader failure.
    #[error("configuration error: {0}")]
    #[diagnostic(code(conteur::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys are: {valid_keys}"),
        None => format!("valid keys are: {valid_keys}"),
    }
}

/// Convert every error inside a `figment::Error` into a diagnostic.
///
/// `toml_sources` are the (path, content) pairs that were merged, highest
/// precedence first. Every config field carries a serde default, so a
/// figment failure here is always a malformed key or value, never a
/// missing one.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| convert_error(e, toml_sources))
        .collect()
}

fn convert_error(error: figment::error::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let valid_keys: Vec<&str> = expected.to_vec();
            let section = error.path.first().map(|s| s.to_string());

            // The first merged file containing the key supplies the span.
            let mut span = None;
            let mut src = None;
            for (path, content) in toml_sources {
                if let Some(offset) = key_offset(content, section.as_deref(), field) {
                    span = Some(SourceSpan::new(offset.into(), field.len()));
                    src = Some(NamedSource::new(path, content.clone()));
                    break;
                }
            }

            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, &valid_keys),
                valid_keys: valid_keys.join(", "),
                span,
                src,
            }
        }
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: error
                .path
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join("."),
            detail: format!("found {actual}"),
            expected: expected.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Byte offset of `key` within `content`, restricted to `section`.
///
/// Walks the file line by line tracking the current `[section]` header, so
/// the same key name in another section never produces a misleading span.
/// `section: None` matches only keys before the first header.
pub fn key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut in_section = section.is_none();
    let mut offset = 0usize;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            let header = trimmed
                .trim_start_matches('[')
                .trim_end()
                .trim_end_matches(']');
            in_section = section == Some(header);
        } else if in_section {
            if let Some(rest) = trimmed.strip_prefix(key) {
                if rest.trim_start().starts_with('=') {
                    return Some(offset + (line.len() - trimmed.len()));
                }
            }
        }
        offset += line.len() + 1;
    }

    None
}

/// The valid key most similar to `unknown`, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut out, diagnostic).is_err() {
            out.push_str(&format!("error: {error}\n"));
        }
    }
    eprint!("{out}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_vocie_for_voice() {
        let valid = &["api_key", "language_code", "voice", "speaking_rate"];
        assert_eq!(suggest_key("vocie", valid), Some("voice".to_string()));
    }

    #[test]
    fn suggest_picks_closest_of_several_candidates() {
        let valid = &["daily_limit_usd", "fail_open", "chat_ledger_failure"];
        assert_eq!(
            suggest_key("daily_limt_usd", valid),
            Some("daily_limit_usd".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["host", "port"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn key_offset_finds_key_in_its_section() {
        let content = "[server]\nport = 8787\n\n[tts]\nvocie = \"fr-FR-Neural2-A\"\n";
        let offset = key_offset(content, Some("tts"), "vocie").unwrap();
        assert_eq!(&content[offset..offset + 5], "vocie");
    }

    #[test]
    fn key_offset_ignores_same_key_in_other_sections() {
        // `model` exists in both [anthropic] and [stt]; the span must land
        // on the [stt] occurrence.
        let content =
            "[anthropic]\nmodel = \"claude-3-5-haiku-20241022\"\n\n[stt]\nmodel = \"@cf/openai/whisper\"\n";
        let offset = key_offset(content, Some("stt"), "model").unwrap();
        assert!(offset > content.find("[stt]").unwrap());
    }

    #[test]
    fn key_offset_matches_top_level_keys_only_before_first_header() {
        let content = "title = \"x\"\n[server]\ntitle = \"y\"\n";
        assert_eq!(key_offset(content, None, "title"), Some(0));
        assert!(key_offset(content, None, "port").is_none());
    }

    #[test]
    fn key_offset_requires_assignment_after_key() {
        // A prefix of a longer key must not match.
        let content = "[budget]\ndaily_limit_usd = 20.0\n";
        assert!(key_offset(content, Some("budget"), "daily_limit").is_none());
    }
}
