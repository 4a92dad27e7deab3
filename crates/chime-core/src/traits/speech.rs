// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech synthesis adapter trait.

use async_trait::async_trait;

use crate::error::ChimeError;

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechAdapter: Send + Sync + 'static {
    /// Synthesizes `text` with the given voice and returns encoded audio bytes.
    ///
    /// Failures are reported as [`ChimeError::Speech`] or
    /// [`ChimeError::Timeout`] and may be transient.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ChimeError>;
}
