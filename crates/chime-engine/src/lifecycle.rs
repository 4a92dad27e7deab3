// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recurrence lifecycle: what a due task does when the runner claims it.
//!
//! Every path here is safe to run more than once for the same task. The
//! runner retries failed tasks, and a task whose previous attempt died
//! after some of its writes must not duplicate them:
//!
//! - the next loop occurrence and the next daily entry are enqueued under
//!   dedupe keys, so re-enqueueing is a no-op;
//! - daily successors are unique per predecessor and are only created
//!   once delivery has won;
//! - `mark_delivered` is conditional and only its winner notifies.

use chime_core::types::{EntryId, EntryKind, EntryStatus, LoopId, ScheduleEntry};
use chime_core::{
    ChimeError, ItemRef, ListItem, ListTarget, Notification, ScheduledTask, UserId,
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::ordering::entry_position;
use crate::schedule::{local_hour_minute, next_day_same_local_time};
use crate::texts;

impl Engine {
    /// Runs one claimed task. An error asks the runner to retry it.
    pub async fn run_task(&self, task: &ScheduledTask) -> Result<(), ChimeError> {
        match task {
            ScheduledTask::DeliverReminder { entry_id } => self.deliver_reminder(*entry_id).await,
            ScheduledTask::LoopRefire {
                loop_id,
                scheduled_fire_at,
                generation,
            } => {
                self.refire_loop(*loop_id, *scheduled_fire_at, *generation)
                    .await
            }
        }
    }

    async fn refire_loop(
        &self,
        loop_id: LoopId,
        scheduled_fire_at: DateTime<Utc>,
        generation: i64,
    ) -> Result<(), ChimeError> {
        let Some(lr) = self.store.find_loop_by_id(loop_id).await? else {
            debug!(loop_id = %loop_id, "re-fire for deleted looping reminder skipped");
            return Ok(());
        };
        if !lr.active || lr.generation != generation {
            debug!(
                loop_id = %loop_id,
                active = lr.active,
                generation = lr.generation,
                task_generation = generation,
                "stale re-fire skipped"
            );
            return Ok(());
        }

        // Next occurrence stays on the original grid; missed slots are
        // skipped rather than replayed.
        let now = self.clock.now();
        let interval = Duration::minutes(i64::from(lr.interval_minutes));
        let mut next = scheduled_fire_at + interval;
        while next <= now {
            next += interval;
        }
        self.scheduler
            .enqueue_at(
                next,
                &ScheduledTask::LoopRefire {
                    loop_id,
                    scheduled_fire_at: next,
                    generation,
                },
            )
            .await?;

        let user = self.user(lr.user_id).await?;
        let audio = self.synthesize(&user, &lr.message).await?;

        // A stop or restart may have committed while synthesis ran.
        let _guard = self.locks.lock(lr.user_id).await;
        let current = self
            .store
            .find_loop_by_id(loop_id)
            .await?
            .is_some_and(|fresh| fresh.active && fresh.generation == generation);
        if !current {
            debug!(loop_id = %loop_id, "looping reminder stopped during synthesis");
            return Ok(());
        }
        self.alert(lr.user_id, audio, lr.message.clone());
        info!(
            user_id = %lr.user_id,
            number = lr.number,
            next_fire_at = %next,
            "looping reminder fired"
        );
        Ok(())
    }

    async fn deliver_reminder(&self, entry_id: EntryId) -> Result<(), ChimeError> {
        let Some(entry) = self.store.find_schedule_entry(entry_id).await? else {
            debug!(entry_id = %entry_id, "delivery for missing entry skipped");
            return Ok(());
        };
        entry.check_invariants()?;
        let user = self.user(entry.user_id).await?;
        let tz = user.tz()?;

        match entry.status {
            EntryStatus::Pending => {}
            // An earlier attempt delivered it and failed before chaining.
            EntryStatus::Delivered if entry.recurs_daily => {
                return self.chain_next_day(&entry, tz).await;
            }
            _ => {
                debug!(entry_id = %entry_id, status = %entry.status, "entry no longer pending");
                return Ok(());
            }
        }

        let text = delivery_text(&entry, tz, self.clock.now());
        let audio = self.synthesize(&user, &text).await?;
        if !self.store.mark_delivered(entry.id).await? {
            debug!(entry_id = %entry.id, "entry cancelled or delivered during synthesis");
            return Ok(());
        }
        self.sink.notify(Notification::Removed {
            user_id: entry.user_id,
            item: ItemRef::Entry(entry.id),
        });
        self.alert(entry.user_id, audio, text);
        info!(user_id = %entry.user_id, entry_id = %entry.id, kind = %entry.kind, "reminder delivered");

        if entry.recurs_daily {
            self.chain_next_day(&entry, tz).await?;
        }
        Ok(())
    }

    /// Ensures the next daily occurrence exists and is queued.
    async fn chain_next_day(&self, entry: &ScheduleEntry, tz: Tz) -> Result<(), ChimeError> {
        let fire_at = next_day_same_local_time(tz, entry.fire_at)?;
        let (next, created) = self.store.create_recurrence(entry.id, fire_at).await?;
        self.scheduler
            .enqueue_at(
                next.fire_at,
                &ScheduledTask::DeliverReminder { entry_id: next.id },
            )
            .await?;
        if created {
            let pending = self
                .store
                .pending_schedule_entries(next.user_id, Some(EntryKind::Daily), self.clock.now())
                .await?;
            self.sink.notify(Notification::Inserted {
                user_id: next.user_id,
                target: ListTarget::DailyReminders,
                position: entry_position(&next, &pending, tz),
                item: ListItem::Entry(next.clone()),
            });
            debug!(entry_id = %entry.id, next_entry_id = %next.id, "daily reminder chained");
        }
        Ok(())
    }

    fn alert(&self, user_id: UserId, audio: Vec<u8>, text: String) {
        let token = self.audio.insert(audio, self.clock.now());
        self.sink.notify(Notification::VoiceAlert {
            user_id,
            token,
            text,
        });
    }
}

/// Timers speak their stored message; reminders announce the current local time.
fn delivery_text(entry: &ScheduleEntry, tz: Tz, now: DateTime<Utc>) -> String {
    match entry.kind {
        EntryKind::Timer => entry.message.clone(),
        EntryKind::OneShot | EntryKind::Daily => {
            let (hour, minute) = local_hour_minute(tz, now);
            texts::reminder_due(hour, minute, &entry.message)
        }
    }
}
