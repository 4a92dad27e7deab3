// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Chime configuration system.

use chime_config::diagnostic::ConfigError;
use chime_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[engine]
log_level = "debug"
default_timezone = "America/Los_Angeles"
interaction_ttl_secs = 120
max_transcript_chars = 500

[storage]
database_path = "/tmp/chime-test.db"

[speech]
api_key = "xi-123"
base_url = "http://localhost:9000/tts"
model_id = "eleven_turbo_v2"
default_voice_id = "voice-abc"
timeout_secs = 5

[sunset]
base_url = "http://localhost:9001/json"
timeout_secs = 3

[worker]
poll_interval_ms = 250
max_attempts = 3
batch_size = 4
audio_ttl_secs = 60
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.engine.log_level, "debug");
    assert_eq!(config.engine.default_timezone, "America/Los_Angeles");
    assert_eq!(config.engine.interaction_ttl_secs, 120);
    assert_eq!(config.storage.database_path, "/tmp/chime-test.db");
    assert_eq!(config.speech.api_key.as_deref(), Some("xi-123"));
    assert_eq!(config.speech.default_voice_id, "voice-abc");
    assert_eq!(config.sunset.timeout_secs, 3);
    assert_eq!(config.worker.batch_size, 4);
    assert_eq!(config.worker.audio_ttl_secs, 60);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[engine]\ndefault_timezon = \"UTC\"\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key,
                suggestion,
                ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an UnknownKey diagnostic");
    assert_eq!(unknown.0, "default_timezon");
    assert_eq!(unknown.1.as_deref(), Some("default_timezone"));
}

#[test]
fn wrong_type_is_reported() {
    let err = load_config_from_str("[worker]\nmax_attempts = \"many\"\n").expect_err("bad type");
    assert!(err.to_string().contains("max_attempts") || err.to_string().contains("string"));
}

#[test]
fn semantic_errors_surface_as_validation() {
    let errors =
        load_and_validate_str("[engine]\ndefault_timezone = \"Mars/Olympus\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn explicit_path_is_loaded() {
    let dir = std::env::temp_dir().join(format!("chime-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("chime.toml");
    std::fs::write(&path, "[worker]\nbatch_size = 9\n").unwrap();

    let config = load_and_validate_path(&path).expect("valid file");
    assert_eq!(config.worker.batch_size, 9);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn env_vars_override_the_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("override.toml", "[worker]\nmax_attempts = 3\n")?;
        jail.set_env("CHIME_WORKER_MAX_ATTEMPTS", "8");
        jail.set_env("CHIME_ENGINE_DEFAULT_TIMEZONE", "Asia/Tokyo");

        let config = load_and_validate_path(std::path::Path::new("override.toml"))
            .expect("env overrides are accepted");
        assert_eq!(config.worker.max_attempts, 8);
        assert_eq!(config.engine.default_timezone, "Asia/Tokyo");
        Ok(())
    });
}

#[test]
fn env_var_for_unknown_section_is_rejected() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("plain.toml", "")?;
        jail.set_env("CHIME_DEBUG", "1");
        assert!(load_and_validate_path(std::path::Path::new("plain.toml")).is_err());
        Ok(())
    });
}
