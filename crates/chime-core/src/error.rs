// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chime reminder engine.

use thiserror::Error;

use crate::types::UserId;

/// The primary error type used across all Chime adapter traits and core operations.
///
/// Parse failures, phrase collisions and missing loops are not errors: the
/// engine resolves them into structured replies. What reaches a caller as a
/// `ChimeError` is either a collaborator failure the caller must decide on,
/// or a defect.
#[derive(Debug, Error)]
pub enum ChimeError {
    /// Configuration errors (invalid TOML, unknown timezone, missing API keys).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Speech synthesis provider errors (HTTP failure, bad status, empty body).
    #[error("speech synthesis error: {message}")]
    Speech {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Sunset lookup provider errors.
    #[error("sunset lookup error: {message}")]
    Sunset {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A persisted-state invariant was broken (duplicate loop number, phrase
    /// uniqueness, kind/recurrence mismatch).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An operation named a user that does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChimeError {
    /// Returns true for failures of an external collaborator (speech synthesis,
    /// sunset lookup) that the caller may retry or replace with a fallback.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            ChimeError::Speech { .. } | ChimeError::Sunset { .. } | ChimeError::Timeout { .. }
        )
    }

    /// Shorthand for a speech error without an underlying source.
    pub fn speech(message: impl Into<String>) -> Self {
        ChimeError::Speech {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a sunset lookup error without an underlying source.
    pub fn sunset(message: impl Into<String>) -> Self {
        ChimeError::Sunset {
            message: message.into(),
            source: None,
        }
    }
}
