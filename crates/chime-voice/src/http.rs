// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared request plumbing: error mapping and the single transient retry.

use std::time::Duration;

use chime_core::ChimeError;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

/// Which collaborator a request belongs to; picks the error variant.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Service {
    Speech,
    Sunset,
}

impl Service {
    pub(crate) fn error(
        self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> ChimeError {
        match self {
            Service::Speech => ChimeError::Speech { message, source },
            Service::Sunset => ChimeError::Sunset { message, source },
        }
    }

    fn transport_error(self, e: reqwest::Error, timeout: Duration) -> ChimeError {
        if e.is_timeout() {
            return ChimeError::Timeout { duration: timeout };
        }
        self.error(format!("HTTP request failed: {e}"), Some(Box::new(e)))
    }
}

/// Retry settings for one client.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(1),
            timeout,
        }
    }
}

/// Sends the request built by `build` and returns the first successful
/// response.
///
/// Transient statuses (429, 500, 503) are retried after `policy.delay`;
/// anything else non-2xx fails immediately with the status and body, with
/// the body passed through `describe` when it recognizes an API error.
pub(crate) async fn send_with_retry<F>(
    service: Service,
    policy: RetryPolicy,
    describe: fn(&str) -> Option<String>,
    build: F,
) -> Result<Response, ChimeError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            warn!(attempt, "retrying request after transient error");
            tokio::time::sleep(policy.delay).await;
        }

        let response = build()
            .send()
            .await
            .map_err(|e| service.transport_error(e, policy.timeout))?;

        let status = response.status();
        debug!(status = %status, attempt, "response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match describe(&body) {
            Some(detail) => format!("API returned {status}: {detail}"),
            None => format!("API returned {status}: {body}"),
        };

        if is_transient_error(status) && attempt < policy.max_retries {
            warn!(status = %status, body = %body, "transient error, will retry");
            last_error = Some(service.error(message, None));
            continue;
        }
        return Err(service.error(message, None));
    }

    Err(last_error
        .unwrap_or_else(|| service.error("request failed after retries".into(), None)))
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
