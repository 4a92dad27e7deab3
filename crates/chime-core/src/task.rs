// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task payloads exchanged with the task scheduler.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, LoopId};

/// Work to run at a future instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduledTask {
    /// Deliver a schedule entry and, for daily entries, chain the next occurrence.
    DeliverReminder { entry_id: EntryId },
    /// Fire one occurrence of a looping reminder.
    ///
    /// `generation` is captured at enqueue time; the task no-ops once the
    /// loop's live generation has moved on.
    LoopRefire {
        loop_id: LoopId,
        scheduled_fire_at: DateTime<Utc>,
        generation: i64,
    },
}

impl ScheduledTask {
    /// Key identifying this exact occurrence. Enqueueing a task whose key is
    /// already queued is a no-op.
    pub fn dedupe_key(&self) -> String {
        match self {
            ScheduledTask::DeliverReminder { entry_id } => format!("deliver:{entry_id}"),
            ScheduledTask::LoopRefire {
                loop_id,
                scheduled_fire_at,
                generation,
            } => format!(
                "loop:{loop_id}:{generation}:{}",
                scheduled_fire_at.timestamp_millis()
            ),
        }
    }

    /// Queue the task belongs to.
    pub fn queue_name(&self) -> &'static str {
        match self {
            ScheduledTask::DeliverReminder { .. } => "reminders",
            ScheduledTask::LoopRefire { .. } => "looping_reminders",
        }
    }
}

/// A task claimed by the runner.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedTask {
    /// Queue row id.
    pub id: i64,
    pub task: ScheduledTask,
    pub run_at: DateTime<Utc>,
    /// Failed attempts so far.
    pub attempts: u32,
    pub max_attempts: u32,
}

/// What happened to a task after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Rescheduled for another attempt.
    Retrying { run_at: DateTime<Utc> },
    /// Attempts exhausted; this occurrence is dropped.
    Dropped,
}

/// Polynomial backoff before the next attempt: `attempts^4 + 2` seconds.
pub fn retry_backoff(attempts: u32) -> Duration {
    let n = u64::from(attempts);
    Duration::from_secs(n.saturating_pow(4).saturating_add(2))
}
