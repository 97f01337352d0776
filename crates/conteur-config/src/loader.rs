// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading via Figment's layered providers.
//!
//! Merge order, later wins: compiled defaults, `/etc/conteur/conteur.toml`,
//! the XDG user config, `./conteur.toml`, then `CONTEUR_*` environment
//! variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ConteurConfig;

/// Config section names, used to rewrite `CONTEUR_<SECTION>_<KEY>` env
/// vars into dotted figment paths.
const SECTIONS: [&str; 7] = [
    "server",
    "agent",
    "budget",
    "anthropic",
    "tts",
    "stt",
    "storage",
];

/// The TOML files consulted, lowest precedence first.
pub(crate) fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/conteur/conteur.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("conteur/conteur.toml"));
    }
    paths.push(PathBuf::from("conteur.toml"));
    paths
}

/// Load configuration from the standard file hierarchy and environment.
pub fn load_config() -> Result<ConteurConfig, figment::Error> {
    let mut figment = Figment::from(Serialized::defaults(ConteurConfig::default()));
    for path in config_file_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider()).extract()
}

/// Load configuration from a TOML string only (no file hierarchy, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ConteurConfig, figment::Error> {
    Figment::from(Serialized::defaults(ConteurConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConteurConfig, figment::Error> {
    Figment::from(Serialized::defaults(ConteurConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `CONTEUR_BUDGET_DAILY_LIMIT_USD` to
/// `budget.daily_limit_usd`.
///
/// The section prefix is matched against the known section list rather
/// than split on `_`, because key names themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("CONTEUR_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        let key = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.to_string().into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_hierarchy_ends_with_local_override() {
        let paths = config_file_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/conteur/conteur.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("conteur.toml")));
    }

    #[test]
    fn every_model_section_is_mapped() {
        let config = ConteurConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        for section in SECTIONS {
            assert!(
                rendered.contains(&format!("[{section}]")),
                "section {section} missing from defaults"
            );
        }
    }
}
