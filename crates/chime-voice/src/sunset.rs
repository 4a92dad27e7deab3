// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! sunrise-sunset.org lookup adapter.
//!
//! Answers are cached per `(latitude, longitude, date)`; a day's sunset
//! does not change, so each location costs one request per day.

use std::time::Duration;

use async_trait::async_trait;
use chime_config::model::SunsetConfig;
use chime_core::{ChimeError, SunsetAdapter};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::http::{RetryPolicy, Service, send_with_retry};

#[derive(Debug, Deserialize)]
struct SunsetResponse {
    status: String,
    #[serde(default)]
    results: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SunsetResults {
    sunset: String,
}

/// Coordinates are keyed by their bit patterns.
type CacheKey = (u64, u64, NaiveDate);

/// Sunset adapter backed by the sunrise-sunset.org JSON API.
#[derive(Debug)]
pub struct SunriseSunset {
    client: reqwest::Client,
    base_url: reqwest::Url,
    policy: RetryPolicy,
    cache: DashMap<CacheKey, DateTime<Utc>>,
}

impl SunriseSunset {
    pub fn new(config: &SunsetConfig) -> Result<Self, ChimeError> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| ChimeError::Config(format!("invalid sunset.base_url: {e}")))?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChimeError::Sunset {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(base_url = %base_url, "sunset adapter initialized");
        Ok(Self {
            client,
            base_url,
            policy: RetryPolicy::new(timeout),
            cache: DashMap::new(),
        })
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.policy.delay = delay;
        self
    }

    fn lookup_url(&self, latitude: f64, longitude: f64, date: NaiveDate) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lng", &longitude.to_string())
            .append_pair("date", &date.format("%Y-%m-%d").to_string())
            .append_pair("formatted", "0");
        url
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<DateTime<Utc>, ChimeError> {
        let url = self.lookup_url(latitude, longitude, date);
        let response = send_with_retry(Service::Sunset, self.policy, |_| None, || {
            self.client.get(url.clone())
        })
        .await?;

        let body = response.text().await.map_err(|e| ChimeError::Sunset {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        parse_sunset(&body)
    }
}

/// Extracts the sunset instant from an API body. Only status `OK` counts.
fn parse_sunset(body: &str) -> Result<DateTime<Utc>, ChimeError> {
    let response: SunsetResponse = serde_json::from_str(body).map_err(|e| ChimeError::Sunset {
        message: format!("invalid response: {e}"),
        source: Some(Box::new(e)),
    })?;
    if response.status != "OK" {
        return Err(ChimeError::sunset(format!("status {}", response.status)));
    }
    let results: SunsetResults =
        serde_json::from_value(response.results).map_err(|e| ChimeError::Sunset {
            message: format!("invalid results: {e}"),
            source: Some(Box::new(e)),
        })?;
    DateTime::parse_from_rfc3339(&results.sunset)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ChimeError::Sunset {
            message: format!("invalid sunset timestamp {:?}: {e}", results.sunset),
            source: Some(Box::new(e)),
        })
}

#[async_trait]
impl SunsetAdapter for SunriseSunset {
    async fn sunset(
        &self,
        latitude: f64,
        longitude: f64,
        date: NaiveDate,
    ) -> Result<DateTime<Utc>, ChimeError> {
        let key = (latitude.to_bits(), longitude.to_bits(), date);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(*cached);
        }

        let sunset = self.fetch(latitude, longitude, date).await?;
        // Past days are never asked for again.
        self.cache.retain(|(_, _, day), _| *day >= date);
        self.cache.insert(key, sunset);
        debug!(latitude, longitude, %date, %sunset, "sunset looked up");
        Ok(sunset)
    }
}
