// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task scheduling traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ChimeError;
use crate::task::{ClaimedTask, RetryOutcome, ScheduledTask};

/// Registers work to run at a future instant.
#[async_trait]
pub trait TaskScheduler: Send + Sync + 'static {
    /// Enqueues `task` to run at `run_at`.
    ///
    /// Returns `false` when a task with the same dedupe key is already queued.
    async fn enqueue_at(
        &self,
        run_at: DateTime<Utc>,
        task: &ScheduledTask,
    ) -> Result<bool, ChimeError>;
}

/// Runner-side view of a durable task queue.
#[async_trait]
pub trait TaskQueue: TaskScheduler {
    /// Claims up to `limit` tasks whose `run_at` is at or before `now`,
    /// oldest first.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ClaimedTask>, ChimeError>;

    /// Marks a claimed task as done at `now`.
    async fn complete(&self, id: i64, now: DateTime<Utc>) -> Result<(), ChimeError>;

    /// Records a failed attempt; reschedules with backoff or drops the task
    /// once its attempts are exhausted.
    async fn retry_or_drop(&self, id: i64, now: DateTime<Utc>)
    -> Result<RetryOutcome, ChimeError>;

    /// Deletes finished (completed or failed) tasks last updated before
    /// `before`. Returns how many were removed.
    async fn prune_finished(&self, before: DateTime<Utc>) -> Result<usize, ChimeError>;
}
