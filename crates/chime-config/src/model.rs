// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chime reminder engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Chime configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChimeConfig {
    /// Interpretation and dispatch settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text-to-speech provider settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Sunset lookup provider settings.
    #[serde(default)]
    pub sunset: SunsetConfig,

    /// Background task runner settings.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Interpretation and dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// IANA timezone assigned to users created without one.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// How long a pending interaction waits for a replacement phrase.
    #[serde(default = "default_interaction_ttl_secs")]
    pub interaction_ttl_secs: u64,

    /// Transcripts longer than this are truncated before dispatch.
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_timezone: default_timezone(),
            interaction_ttl_secs: default_interaction_ttl_secs(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_interaction_ttl_secs() -> u64 {
    300
}

fn default_max_transcript_chars() -> usize {
    1000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("chime").join("chime.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("chime.db"))
        .to_string_lossy()
        .into_owned()
}

/// Text-to-speech provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// ElevenLabs API key. `None` falls back to the `ELEVENLABS_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the text-to-speech endpoint; the voice id is appended.
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Synthesis model identifier.
    #[serde(default = "default_speech_model")]
    pub model_id: String,

    /// Voice used for users without their own.
    #[serde(default = "default_voice_id")]
    pub default_voice_id: String,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_speech_base_url(),
            model_id: default_speech_model(),
            default_voice_id: default_voice_id(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io/v1/text-to-speech".to_string()
}

fn default_speech_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

/// Sunset lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SunsetConfig {
    /// sunrise-sunset.org compatible JSON endpoint.
    #[serde(default = "default_sunset_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SunsetConfig {
    fn default() -> Self {
        Self {
            base_url: default_sunset_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_sunset_base_url() -> String {
    "https://api.sunrise-sunset.org/json".to_string()
}

/// Background task runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Delay between queue polls when idle, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Attempts per task before an occurrence is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum tasks claimed per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long synthesized alert audio stays retrievable, in seconds.
    #[serde(default = "default_audio_ttl_secs")]
    pub audio_ttl_secs: u64,

    /// Completed and failed queue rows older than this are deleted, in hours.
    #[serde(default = "default_task_retention_hours")]
    pub task_retention_hours: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            batch_size: default_batch_size(),
            audio_ttl_secs: default_audio_ttl_secs(),
            task_retention_hours: default_task_retention_hours(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_batch_size() -> usize {
    16
}

fn default_audio_ttl_secs() -> u64 {
    300
}

fn default_task_retention_hours() -> u64 {
    24 * 7
}
