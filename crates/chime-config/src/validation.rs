// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ChimeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first.
pub fn validate_config(config: &ChimeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.engine.log_level.as_str()) {
        invalid(format!(
            "engine.log_level `{}` must be one of {}",
            config.engine.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if chime_core::types::parse_timezone(&config.engine.default_timezone).is_err() {
        invalid(format!(
            "engine.default_timezone `{}` is not an IANA timezone name",
            config.engine.default_timezone
        ));
    }

    if config.engine.interaction_ttl_secs == 0 {
        invalid("engine.interaction_ttl_secs must be greater than 0".to_string());
    }

    if config.engine.max_transcript_chars == 0 {
        invalid("engine.max_transcript_chars must be greater than 0".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    for (key, url) in [
        ("speech.base_url", &config.speech.base_url),
        ("sunset.base_url", &config.sunset.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            invalid(format!("{key} `{url}` must be an http(s) URL"));
        }
    }

    if config.speech.default_voice_id.trim().is_empty() {
        invalid("speech.default_voice_id must not be empty".to_string());
    }

    if config.worker.max_attempts == 0 {
        invalid("worker.max_attempts must be at least 1".to_string());
    }

    if config.worker.task_retention_hours == 0 {
        invalid("worker.task_retention_hours must be greater than 0".to_string());
    }

    if config.worker.batch_size == 0 {
        invalid("worker.batch_size must be at least 1".to_string());
    }

    if config.worker.poll_interval_ms == 0 {
        invalid("worker.poll_interval_ms must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
