// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./chime.toml` > `~/.config/chime/chime.toml` > `/etc/chime/chime.toml`,
//! with `CHIME_*` environment variables applied last.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChimeConfig;

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &["engine", "storage", "speech", "sunset", "worker"];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/chime/chime.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "chime.toml";

/// The per-user config file under the XDG config dir, if one can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chime").join("chime.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chime/chime.toml`
/// 3. `~/.config/chime/chime.toml`
/// 4. `./chime.toml`
/// 5. `CHIME_*` environment variables
pub fn load_config() -> Result<ChimeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ChimeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChimeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps `CHIME_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `CHIME_WORKER_MAX_ATTEMPTS` maps to `worker.max_attempts`.
fn env_provider() -> Env {
    Env::prefixed("CHIME_").map(|key| {
        // Keys arrive in their original case.
        let key_str = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_into_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CHIME_WORKER_MAX_ATTEMPTS", "7");
            jail.set_env("CHIME_ENGINE_DEFAULT_TIMEZONE", "Europe/Berlin");
            jail.set_env("CHIME_SPEECH_API_KEY", "xi-test");

            let config: ChimeConfig = Figment::new()
                .merge(Serialized::defaults(ChimeConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.worker.max_attempts, 7);
            assert_eq!(config.engine.default_timezone, "Europe/Berlin");
            assert_eq!(config.speech.api_key.as_deref(), Some("xi-test"));
            Ok(())
        });
    }

    #[test]
    fn local_file_is_read_from_working_directory() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_PATH,
                r#"
[storage]
database_path = "/var/lib/chime/test.db"
"#,
            )?;
            let config = load_config()?;
            assert_eq!(config.storage.database_path, "/var/lib/chime/test.db");
            Ok(())
        });
    }
}
