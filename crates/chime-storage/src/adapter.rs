// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ReminderStore and TaskQueue traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use chime_config::model::{StorageConfig, WorkerConfig};
use chime_core::types::{
    CommandAlias, EntryId, EntryKind, InteractionId, LoopId, LoopingReminder, NewLoopingReminder,
    NewPendingInteraction, NewScheduleEntry, NewUser, PendingInteraction, ScheduleEntry, User,
    UserId, VoiceCommand, VoiceCommandId, VoiceCommandStatus,
};
use chime_core::{
    ChimeError, ClaimedTask, ReminderStore, RetryOutcome, ScheduledTask, TaskQueue,
    TaskScheduler,
};

use crate::database::Database;
use crate::queries;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// SQLite-backed store and task queue.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
pub struct SqliteStorage {
    db: Database,
    max_attempts: u32,
}

impl SqliteStorage {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Opens the database named by the storage section; queued tasks get the
    /// worker section's attempt limit.
    pub async fn open(storage: &StorageConfig, worker: &WorkerConfig) -> Result<Self, ChimeError> {
        let db = Database::open(&storage.database_path).await?;
        debug!(path = %storage.database_path, "SQLite storage initialized");
        Ok(Self::new(db).with_max_attempts(worker.max_attempts))
    }

    pub async fn open_in_memory() -> Result<Self, ChimeError> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    /// Attempts a task gets before it is dropped.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The user's most recent audited commands, newest first.
    pub async fn recent_voice_commands(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<VoiceCommand>, ChimeError> {
        queries::voice_commands::recent(&self.db, user_id, limit).await
    }

    /// Every pending task with its run time, soonest first.
    pub async fn pending_tasks(&self) -> Result<Vec<(DateTime<Utc>, ScheduledTask)>, ChimeError> {
        queries::queue::pending_tasks(&self.db).await
    }

    /// Returns tasks left in `processing` by a crashed worker to `pending`.
    pub async fn recover_interrupted(&self) -> Result<usize, ChimeError> {
        queries::queue::recover_interrupted(&self.db).await
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), ChimeError> {
        self.db.close().await
    }
}

#[async_trait]
impl ReminderStore for SqliteStorage {
    // --- Users ---

    async fn find_user(&self, id: UserId) -> Result<Option<User>, ChimeError> {
        queries::users::find_user(&self.db, id).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, ChimeError> {
        queries::users::create_user(&self.db, user).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ChimeError> {
        queries::users::list_users(&self.db).await
    }

    // --- Schedule entries ---

    async fn create_schedule_entry(
        &self,
        entry: NewScheduleEntry,
    ) -> Result<ScheduleEntry, ChimeError> {
        queries::entries::create_entry(&self.db, entry).await
    }

    async fn find_schedule_entry(&self, id: EntryId) -> Result<Option<ScheduleEntry>, ChimeError> {
        queries::entries::find_entry(&self.db, id).await
    }

    async fn pending_schedule_entries(
        &self,
        user_id: UserId,
        kind: Option<EntryKind>,
        after: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>, ChimeError> {
        queries::entries::pending_entries(&self.db, user_id, kind, after).await
    }

    async fn mark_delivered(&self, id: EntryId) -> Result<bool, ChimeError> {
        queries::entries::mark_delivered(&self.db, id).await
    }

    async fn cancel_schedule_entry(
        &self,
        user_id: UserId,
        id: EntryId,
    ) -> Result<bool, ChimeError> {
        queries::entries::cancel_entry(&self.db, user_id, id).await
    }

    async fn create_recurrence(
        &self,
        previous: EntryId,
        fire_at: DateTime<Utc>,
    ) -> Result<(ScheduleEntry, bool), ChimeError> {
        queries::entries::create_recurrence(&self.db, previous, fire_at).await
    }

    // --- Looping reminders ---

    async fn find_loop_by_number(
        &self,
        user_id: UserId,
        number: i64,
    ) -> Result<Option<LoopingReminder>, ChimeError> {
        queries::loops::find_loop_by_number(&self.db, user_id, number).await
    }

    async fn find_loop(
        &self,
        user_id: UserId,
        id: LoopId,
    ) -> Result<Option<LoopingReminder>, ChimeError> {
        queries::loops::find_loop(&self.db, user_id, id).await
    }

    async fn find_loop_by_id(&self, id: LoopId) -> Result<Option<LoopingReminder>, ChimeError> {
        queries::loops::find_loop_by_id(&self.db, id).await
    }

    async fn list_loops(&self, user_id: UserId) -> Result<Vec<LoopingReminder>, ChimeError> {
        queries::loops::list_loops(&self.db, user_id).await
    }

    async fn next_loop_number(&self, user_id: UserId) -> Result<i64, ChimeError> {
        queries::loops::next_loop_number(&self.db, user_id).await
    }

    async fn create_looping_reminder(
        &self,
        new: NewLoopingReminder,
    ) -> Result<LoopingReminder, ChimeError> {
        queries::loops::create_loop(&self.db, new).await
    }

    async fn set_loop_active(
        &self,
        user_id: UserId,
        id: LoopId,
        active: bool,
    ) -> Result<Option<LoopingReminder>, ChimeError> {
        queries::loops::set_active(&self.db, user_id, id, active).await
    }

    async fn bump_loop_generation(
        &self,
        user_id: UserId,
        id: LoopId,
    ) -> Result<Option<LoopingReminder>, ChimeError> {
        queries::loops::bump_generation(&self.db, user_id, id).await
    }

    async fn delete_looping_reminder(
        &self,
        user_id: UserId,
        id: LoopId,
    ) -> Result<bool, ChimeError> {
        queries::loops::delete_loop(&self.db, user_id, id).await
    }

    // --- Aliases ---

    async fn find_alias(
        &self,
        user_id: UserId,
        phrase: &str,
    ) -> Result<Option<CommandAlias>, ChimeError> {
        queries::aliases::find_alias(&self.db, user_id, phrase).await
    }

    async fn create_alias(
        &self,
        user_id: UserId,
        loop_id: LoopId,
        phrase: &str,
    ) -> Result<CommandAlias, ChimeError> {
        queries::aliases::create_alias(&self.db, user_id, loop_id, phrase).await
    }

    async fn list_aliases(&self, user_id: UserId) -> Result<Vec<CommandAlias>, ChimeError> {
        queries::aliases::list_aliases(&self.db, user_id).await
    }

    // --- Pending interactions ---

    async fn active_pending_interaction(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingInteraction>, ChimeError> {
        queries::interactions::active_interaction(&self.db, user_id, now).await
    }

    async fn create_pending_interaction(
        &self,
        new: NewPendingInteraction,
    ) -> Result<PendingInteraction, ChimeError> {
        queries::interactions::create_interaction(&self.db, new).await
    }

    async fn destroy_pending_interaction(
        &self,
        user_id: UserId,
        id: InteractionId,
    ) -> Result<bool, ChimeError> {
        queries::interactions::destroy_interaction(&self.db, user_id, id).await
    }

    async fn refresh_pending_interaction(
        &self,
        user_id: UserId,
        id: InteractionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, ChimeError> {
        queries::interactions::refresh_interaction(&self.db, user_id, id, expires_at).await
    }

    async fn purge_expired_interactions(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<usize, ChimeError> {
        queries::interactions::purge_expired(&self.db, user_id, now).await
    }

    // --- Voice command audit log ---

    async fn record_voice_command(
        &self,
        user_id: UserId,
        transcript: &str,
        intent: &str,
        params: &serde_json::Value,
    ) -> Result<VoiceCommandId, ChimeError> {
        queries::voice_commands::record(&self.db, user_id, transcript, intent, params).await
    }

    async fn update_voice_command_status(
        &self,
        id: VoiceCommandId,
        status: VoiceCommandStatus,
    ) -> Result<(), ChimeError> {
        queries::voice_commands::update_status(&self.db, id, status).await
    }
}

#[async_trait]
impl TaskScheduler for SqliteStorage {
    async fn enqueue_at(
        &self,
        run_at: DateTime<Utc>,
        task: &ScheduledTask,
    ) -> Result<bool, ChimeError> {
        queries::queue::enqueue_at(&self.db, run_at, task, self.max_attempts).await
    }
}

#[async_trait]
impl TaskQueue for SqliteStorage {
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ClaimedTask>, ChimeError> {
        queries::queue::claim_due(&self.db, now, limit).await
    }

    async fn complete(&self, id: i64, now: DateTime<Utc>) -> Result<(), ChimeError> {
        queries::queue::complete(&self.db, id, now).await
    }

    async fn retry_or_drop(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<RetryOutcome, ChimeError> {
        queries::queue::retry_or_drop(&self.db, id, now).await
    }

    async fn prune_finished(&self, before: DateTime<Utc>) -> Result<usize, ChimeError> {
        queries::queue::prune_finished(&self.db, before).await
    }
}
