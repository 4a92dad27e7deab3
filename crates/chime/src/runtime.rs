// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the engine to its production collaborators.

use std::sync::Arc;

use chime_config::ChimeConfig;
use chime_core::{ChimeError, NotificationSink, SunsetAdapter, SystemClock};
use chime_engine::{Collaborators, Engine, EngineSettings};
use chime_storage::SqliteStorage;
use chime_voice::{ElevenLabsSpeech, SunriseSunset};
use tracing::debug;

/// The engine plus the SQLite store behind it.
pub struct App {
    pub engine: Arc<Engine>,
    pub storage: Arc<SqliteStorage>,
}

impl App {
    /// Opens the database and builds the engine with the ElevenLabs and
    /// sunrise-sunset adapters.
    pub async fn open(
        config: &ChimeConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, ChimeError> {
        let storage = Arc::new(SqliteStorage::open(&config.storage, &config.worker).await?);
        let speech = Arc::new(ElevenLabsSpeech::new(&config.speech)?);
        let sunset: Arc<dyn SunsetAdapter> = Arc::new(SunriseSunset::new(&config.sunset)?);

        let engine = Arc::new(Engine::new(
            Collaborators {
                store: storage.clone(),
                scheduler: storage.clone(),
                speech,
                sunset: Some(sunset),
                sink,
                clock: Arc::new(SystemClock),
            },
            EngineSettings::from_config(config),
        ));
        Ok(Self { engine, storage })
    }

    /// Drops the engine and checkpoints the database if nothing else holds it.
    pub async fn close(self) -> Result<(), ChimeError> {
        drop(self.engine);
        match Arc::try_unwrap(self.storage) {
            Ok(storage) => storage.close().await,
            Err(_) => {
                debug!("storage still shared, skipping explicit close");
                Ok(())
            }
        }
    }
}
