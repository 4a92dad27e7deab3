// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech adapter for deterministic testing.
//!
//! `MockSpeech` implements `SpeechAdapter` by returning the UTF-8 bytes of
//! the text it was asked to speak, so tests can read the "audio" back.
//! [`MockSpeech::hold_next`] parks the next call until released, which lets
//! a test commit a change while synthesis is in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chime_core::{ChimeError, SpeechAdapter};
use tokio::sync::{Notify, Semaphore};

/// One synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechCall {
    pub text: String,
    pub voice_id: String,
}

/// Handle on a parked synthesis call.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    open: Arc<Semaphore>,
    entered: Arc<Notify>,
}

impl SpeechGate {
    fn new() -> Self {
        Self {
            open: Arc::new(Semaphore::new(0)),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Resolves once the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the held call finish.
    pub fn release(&self) {
        self.open.close();
    }

    async fn wait(&self) {
        self.entered.notify_one();
        // Closing the semaphore is the release signal.
        let _ = self.open.acquire().await;
    }
}

#[derive(Debug, Default)]
pub struct MockSpeech {
    calls: Mutex<Vec<SpeechCall>>,
    failures: AtomicUsize,
    held: Mutex<Option<SpeechGate>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` synthesis calls fail with a speech error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Parks the next synthesis call until the returned gate is released.
    /// Later calls are not affected.
    pub fn hold_next(&self) -> SpeechGate {
        let gate = SpeechGate::new();
        *self.held.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Every request so far, failed ones included.
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.text).collect()
    }
}

#[async_trait]
impl SpeechAdapter for MockSpeech {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ChimeError> {
        self.calls.lock().unwrap().push(SpeechCall {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
        });
        let gate = self.held.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ChimeError::speech("mock speech failure"));
        }
        Ok(text.as_bytes().to_vec())
    }
}
