// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user serialization of dispatch and respond.

use std::sync::Arc;

use chime_core::UserId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user, created on first use and dropped once nobody
/// holds or waits for it.
///
/// Holding the guard serializes every check-then-create sequence for that
/// user (phrase collisions, loop numbering, pending interactions). Different
/// users never contend.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

/// Held lock for one user. Dropping it releases the lock and evicts the
/// user's entry when it was the last reference.
#[derive(Debug)]
pub struct UserGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<UserId, Arc<Mutex<()>>>,
    user_id: UserId,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        // Release first so the guard's own Arc is gone before counting.
        self.guard.take();
        self.locks
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the user's lock guard.
    pub async fn lock(&self, user_id: UserId) -> UserGuard<'_> {
        // The map shard guard must be released before awaiting.
        let mutex = Arc::clone(&self.locks.entry(user_id).or_default());
        let guard = mutex.lock_owned().await;
        UserGuard {
            guard: Some(guard),
            locks: &self.locks,
            user_id,
        }
    }

    /// Number of users currently holding or waiting for a lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
