// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for reminder persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ChimeError;
use crate::types::{
    CommandAlias, EntryId, EntryKind, InteractionId, LoopId, LoopingReminder, NewLoopingReminder,
    NewPendingInteraction, NewScheduleEntry, NewUser, PendingInteraction, ScheduleEntry, User,
    UserId, VoiceCommandId, VoiceCommandStatus,
};

/// Persistent record store for users, schedule entries, looping reminders,
/// aliases, pending interactions and the voice command audit log.
///
/// Every method taking a `user_id` only sees that user's rows. The methods
/// without one (`find_schedule_entry`, `find_loop_by_id`, `mark_delivered`,
/// `create_recurrence`) exist for the background lifecycle.
#[async_trait]
pub trait ReminderStore: Send + Sync + 'static {
    // --- Users ---

    async fn find_user(&self, id: UserId) -> Result<Option<User>, ChimeError>;

    async fn create_user(&self, user: NewUser) -> Result<User, ChimeError>;

    async fn list_users(&self) -> Result<Vec<User>, ChimeError>;

    // --- Schedule entries ---

    async fn create_schedule_entry(
        &self,
        entry: NewScheduleEntry,
    ) -> Result<ScheduleEntry, ChimeError>;

    async fn find_schedule_entry(&self, id: EntryId) -> Result<Option<ScheduleEntry>, ChimeError>;

    /// Pending entries firing strictly after `after`, optionally of one kind,
    /// ordered by `fire_at` then id.
    async fn pending_schedule_entries(
        &self,
        user_id: UserId,
        kind: Option<EntryKind>,
        after: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>, ChimeError>;

    /// Transitions a pending entry to delivered. Returns `false` if the entry
    /// was no longer pending.
    async fn mark_delivered(&self, id: EntryId) -> Result<bool, ChimeError>;

    /// Transitions a pending entry to cancelled. Returns `false` if the entry
    /// does not exist for this user or was no longer pending.
    async fn cancel_schedule_entry(&self, user_id: UserId, id: EntryId)
    -> Result<bool, ChimeError>;

    /// Creates the occurrence following `previous` at `fire_at`, copying its
    /// user, kind and message. At most one successor exists per entry: when
    /// it already exists it is returned with `false`.
    async fn create_recurrence(
        &self,
        previous: EntryId,
        fire_at: DateTime<Utc>,
    ) -> Result<(ScheduleEntry, bool), ChimeError>;

    // --- Looping reminders ---

    async fn find_loop_by_number(
        &self,
        user_id: UserId,
        number: i64,
    ) -> Result<Option<LoopingReminder>, ChimeError>;

    async fn find_loop(
        &self,
        user_id: UserId,
        id: LoopId,
    ) -> Result<Option<LoopingReminder>, ChimeError>;

    async fn find_loop_by_id(&self, id: LoopId) -> Result<Option<LoopingReminder>, ChimeError>;

    /// All of the user's loops ordered by number.
    async fn list_loops(&self, user_id: UserId) -> Result<Vec<LoopingReminder>, ChimeError>;

    /// The number the next created loop would receive (max + 1, starting at 1).
    async fn next_loop_number(&self, user_id: UserId) -> Result<i64, ChimeError>;

    /// Creates an active loop at generation 0. The number is assigned as
    /// [`next_loop_number`](Self::next_loop_number) inside the same write
    /// transaction, so concurrent creations never share a number.
    async fn create_looping_reminder(
        &self,
        new: NewLoopingReminder,
    ) -> Result<LoopingReminder, ChimeError>;

    async fn set_loop_active(
        &self,
        user_id: UserId,
        id: LoopId,
        active: bool,
    ) -> Result<Option<LoopingReminder>, ChimeError>;

    async fn bump_loop_generation(
        &self,
        user_id: UserId,
        id: LoopId,
    ) -> Result<Option<LoopingReminder>, ChimeError>;

    /// Deletes a loop together with its aliases.
    async fn delete_looping_reminder(&self, user_id: UserId, id: LoopId)
    -> Result<bool, ChimeError>;

    // --- Aliases ---

    /// Case-insensitive exact lookup.
    async fn find_alias(
        &self,
        user_id: UserId,
        phrase: &str,
    ) -> Result<Option<CommandAlias>, ChimeError>;

    async fn create_alias(
        &self,
        user_id: UserId,
        loop_id: LoopId,
        phrase: &str,
    ) -> Result<CommandAlias, ChimeError>;

    async fn list_aliases(&self, user_id: UserId) -> Result<Vec<CommandAlias>, ChimeError>;

    // --- Pending interactions ---

    /// The earliest-created interaction with `expires_at > now`.
    async fn active_pending_interaction(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingInteraction>, ChimeError>;

    async fn create_pending_interaction(
        &self,
        new: NewPendingInteraction,
    ) -> Result<PendingInteraction, ChimeError>;

    async fn destroy_pending_interaction(
        &self,
        user_id: UserId,
        id: InteractionId,
    ) -> Result<bool, ChimeError>;

    async fn refresh_pending_interaction(
        &self,
        user_id: UserId,
        id: InteractionId,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, ChimeError>;

    /// Deletes interactions with `expires_at <= now`; returns how many.
    async fn purge_expired_interactions(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<usize, ChimeError>;

    // --- Voice command audit log ---

    async fn record_voice_command(
        &self,
        user_id: UserId,
        transcript: &str,
        intent: &str,
        params: &serde_json::Value,
    ) -> Result<VoiceCommandId, ChimeError>;

    async fn update_voice_command_status(
        &self,
        id: VoiceCommandId,
        status: VoiceCommandStatus,
    ) -> Result<(), ChimeError>;
}
