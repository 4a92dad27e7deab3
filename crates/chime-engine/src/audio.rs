// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived cache of synthesized alert audio keyed by random token.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug)]
struct CachedAudio {
    bytes: Arc<Vec<u8>>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AudioCache {
    entries: DashMap<String, CachedAudio>,
    ttl: Duration,
}

impl AudioCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Stores `bytes` and returns the token that retrieves them.
    pub fn insert(&self, bytes: Vec<u8>, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        self.entries.insert(
            token.clone(),
            CachedAudio {
                bytes: Arc::new(bytes),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Audio for `token` unless it has expired.
    pub fn get(&self, token: &str, now: DateTime<Utc>) -> Option<Arc<Vec<u8>>> {
        self.entries
            .get(token)
            .filter(|cached| cached.expires_at > now)
            .map(|cached| Arc::clone(&cached.bytes))
    }

    /// Drops expired audio; returns how many entries were removed.
    pub fn purge(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| cached.expires_at > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn audio_expires_after_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let cache = AudioCache::new(Duration::minutes(5));
        let token = cache.insert(vec![1, 2, 3], now);

        assert_eq!(
            cache.get(&token, now + Duration::seconds(299)).as_deref(),
            Some(&vec![1, 2, 3])
        );
        assert!(cache.get(&token, now + Duration::minutes(5)).is_none());
        assert!(cache.get("missing", now).is_none());

        assert_eq!(cache.purge(now + Duration::minutes(5)), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn tokens_are_unique() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let cache = AudioCache::new(Duration::minutes(5));
        let a = cache.insert(vec![1], now);
        let b = cache.insert(vec![1], now);
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
    }
}
