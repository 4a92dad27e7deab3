// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ElevenLabs text-to-speech adapter.

use std::time::Duration;

use async_trait::async_trait;
use chime_config::model::SpeechConfig;
use chime_core::{ChimeError, SpeechAdapter};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, info};

use crate::http::{RetryPolicy, Service, send_with_retry};

/// Request body for `POST {base_url}/{voice_id}`.
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Speech adapter backed by the ElevenLabs API.
///
/// API key resolution order: config -> `ELEVENLABS_API_KEY` env var -> error.
#[derive(Debug, Clone)]
pub struct ElevenLabsSpeech {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
    policy: RetryPolicy,
}

impl ElevenLabsSpeech {
    pub fn new(config: &SpeechConfig) -> Result<Self, ChimeError> {
        let api_key = resolve_api_key(&config.api_key)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "xi-api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|e| ChimeError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("audio/mpeg"));

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ChimeError::Speech {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(model = %config.model_id, "ElevenLabs speech adapter initialized");
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            policy: RetryPolicy::new(timeout),
        })
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }
}

#[async_trait]
impl SpeechAdapter for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ChimeError> {
        let url = format!("{}/{}", self.base_url, voice_id);
        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
        };

        let response = send_with_retry(Service::Speech, self.policy, describe_error, || {
            self.client.post(&url).json(&body)
        })
        .await?;

        let audio = response.bytes().await.map_err(|e| ChimeError::Speech {
            message: format!("failed to read audio body: {e}"),
            source: Some(Box::new(e)),
        })?;
        if audio.is_empty() {
            return Err(ChimeError::speech("empty audio response"));
        }
        debug!(voice_id, chars = text.chars().count(), bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

/// Pulls the message out of an ElevenLabs error body.
///
/// The API answers either `{"detail": {"status": .., "message": ..}}` or
/// `{"detail": "text"}`.
fn describe_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    if let Some(text) = detail.as_str() {
        return Some(text.to_string());
    }
    let message = detail.get("message")?.as_str()?;
    match detail.get("status").and_then(|s| s.as_str()) {
        Some(status) => Some(format!("{status}: {message}")),
        None => Some(message.to_string()),
    }
}

/// Resolves the API key: config value if non-empty, else `ELEVENLABS_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, ChimeError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
        ChimeError::Config(
            "ElevenLabs API key not found. Set speech.api_key in config or ELEVENLABS_API_KEY environment variable.".into(),
        )
    })
}
