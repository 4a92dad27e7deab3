// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sunset lookup adapter trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ChimeError;

/// Looks up the sunset instant for a location and calendar date.
#[async_trait]
pub trait SunsetAdapter: Send + Sync + 'static {
    async fn sunset(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<DateTime<Utc>, ChimeError>;
}
