// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chime integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockSpeech`] - speech adapter that echoes text as audio bytes
//! - [`MockSunset`] - sunset adapter returning a fixed instant
//! - [`RecordingSink`] - notification sink that keeps every event
//! - [`ManualClock`] - clock that only moves when told to
//! - [`TestHarness`] - engine, SQLite store and worker wired together

pub mod clock;
pub mod harness;
pub mod mock_speech;
pub mod mock_sunset;
pub mod recording;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_speech::{MockSpeech, SpeechGate};
pub use mock_sunset::MockSunset;
pub use recording::RecordingSink;
