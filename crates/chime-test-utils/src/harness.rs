// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the engine with mock speech and sunset adapters,
//! a recording sink, a manual clock and a temp SQLite database that serves
//! as both store and task queue. `say()` drives the full utterance
//! pipeline; `advance_and_run()` moves time forward and lets the worker run
//! whatever became due.

use std::sync::Arc;

use chime_config::model::{StorageConfig, WorkerConfig};
use chime_core::types::{NewUser, User};
use chime_core::{ChimeError, Clock, ReminderStore, SunsetAdapter, UserId};
use chime_engine::{Collaborators, Engine, EngineSettings, Reply, TickReport, Worker};
use chime_storage::SqliteStorage;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clock::ManualClock;
use crate::mock_speech::MockSpeech;
use crate::mock_sunset::MockSunset;
use crate::recording::RecordingSink;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    now: DateTime<Utc>,
    timezone: String,
    location: Option<(f64, f64)>,
    sunset_at: Option<DateTime<Utc>>,
    settings: EngineSettings,
    worker: WorkerConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            // 2:11 PM in New York.
            now: Utc
                .with_ymd_and_hms(2026, 1, 15, 19, 11, 0)
                .single()
                .unwrap_or_default(),
            timezone: "America/New_York".to_string(),
            location: None,
            sunset_at: None,
            settings: EngineSettings::default(),
            worker: WorkerConfig::default(),
        }
    }

    /// Sets the clock's starting instant.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Sets the primary user's IANA timezone.
    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }

    /// Gives the primary user coordinates.
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some((latitude, longitude));
        self
    }

    /// Installs a sunset adapter that always answers `at`.
    pub fn with_sunset(mut self, at: DateTime<Utc>) -> Self {
        self.sunset_at = Some(at);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.worker.max_attempts = max_attempts;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ChimeError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ChimeError::Storage { source: e.into() })?;
        let storage_config = StorageConfig {
            database_path: temp_dir
                .path()
                .join("test.db")
                .to_string_lossy()
                .into_owned(),
        };
        let storage = Arc::new(SqliteStorage::open(&storage_config, &self.worker).await?);

        let speech = Arc::new(MockSpeech::new());
        let sink = Arc::new(RecordingSink::new());
        let clock = Arc::new(ManualClock::new(self.now));
        let sunset = self.sunset_at.map(|at| Arc::new(MockSunset::new(at)));

        let engine = Arc::new(Engine::new(
            Collaborators {
                store: storage.clone(),
                scheduler: storage.clone(),
                speech: speech.clone(),
                sunset: sunset.clone().map(|s| s as Arc<dyn SunsetAdapter>),
                sink: sink.clone(),
                clock: clock.clone(),
            },
            self.settings,
        ));
        let worker = Worker::new(engine.clone(), storage.clone(), &self.worker);

        let user = storage
            .create_user(NewUser {
                name: "Ada".to_string(),
                timezone: self.timezone,
                voice_id: None,
                latitude: self.location.map(|(lat, _)| lat),
                longitude: self.location.map(|(_, lng)| lng),
            })
            .await?;

        Ok(TestHarness {
            engine,
            storage,
            speech,
            sink,
            clock,
            sunset,
            worker,
            user,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine stack for integration tests.
pub struct TestHarness {
    pub engine: Arc<Engine>,
    pub storage: Arc<SqliteStorage>,
    pub speech: Arc<MockSpeech>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
    pub sunset: Option<Arc<MockSunset>>,
    pub worker: Worker,
    /// The user created at build time.
    pub user: User,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Builds a harness with default settings.
    pub async fn new() -> Result<Self, ChimeError> {
        Self::builder().build().await
    }

    /// Sends an utterance from the primary user.
    pub async fn say(&self, transcript: &str) -> Result<Reply, ChimeError> {
        self.engine.handle_utterance(self.user.id, transcript).await
    }

    pub async fn say_as(&self, user_id: UserId, transcript: &str) -> Result<Reply, ChimeError> {
        self.engine.handle_utterance(user_id, transcript).await
    }

    /// Creates another user in the primary user's timezone.
    pub async fn add_user(&self, name: &str) -> Result<User, ChimeError> {
        self.storage
            .create_user(NewUser {
                name: name.to_string(),
                timezone: self.user.timezone.clone(),
                voice_id: None,
                latitude: None,
                longitude: None,
            })
            .await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        self.clock.advance(by)
    }

    /// Runs every task due at the current instant.
    pub async fn run_due(&self) -> Result<TickReport, ChimeError> {
        self.worker.tick().await
    }

    /// Moves the clock and runs what became due.
    pub async fn advance_and_run(&self, by: Duration) -> Result<TickReport, ChimeError> {
        self.advance(by);
        self.run_due().await
    }
}
