// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock sunset adapter returning a fixed instant.

use std::sync::Mutex;

use async_trait::async_trait;
use chime_core::{ChimeError, SunsetAdapter};
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug)]
pub struct MockSunset {
    at: DateTime<Utc>,
    lookups: Mutex<Vec<(f64, f64, NaiveDate)>>,
}

impl MockSunset {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// `(latitude, longitude, date)` of every lookup.
    pub fn lookups(&self) -> Vec<(f64, f64, NaiveDate)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SunsetAdapter for MockSunset {
    async fn sunset(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<DateTime<Utc>, ChimeError> {
        self.lookups.lock().unwrap().push((latitude, longitude, date));
        Ok(self.at)
    }
}
