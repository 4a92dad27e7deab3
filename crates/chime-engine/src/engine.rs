// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine: turns one utterance into a reply, under the user's lock.
//!
//! Per utterance the engine purges expired interactions, loads the active
//! interaction and the phrase registry, resolves the command, applies the
//! interaction transition, records the command in the audit log and runs
//! the command. The lock is released before the reply is synthesized.

use std::sync::Arc;

use chime_config::ChimeConfig;
use chime_core::types::{
    CommandAlias, EntryId, EntryKind, LoopingReminder, ScheduleEntry, User, VoiceCommandId,
    VoiceCommandStatus,
};
use chime_core::{
    ChimeError, Clock, Command, ItemRef, Notification, NotificationSink, ReminderStore,
    SpeechAdapter, SunsetAdapter, TaskScheduler, UserId,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::audio::AudioCache;
use crate::dispatcher::{ConversationState, Transition, resolve};
use crate::locks::UserLocks;
use crate::ordering::entry_sort_key;
use crate::registry::PhraseRegistry;
use crate::texts;

/// Tunables taken from [`ChimeConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How long a pending interaction waits for its replacement phrase.
    pub interaction_ttl: Duration,
    pub max_transcript_chars: usize,
    pub default_voice_id: String,
    /// How long alert audio stays retrievable by token.
    pub audio_ttl: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &ChimeConfig) -> Self {
        Self {
            interaction_ttl: secs(config.engine.interaction_ttl_secs),
            max_transcript_chars: config.engine.max_transcript_chars,
            default_voice_id: config.speech.default_voice_id.clone(),
            audio_ttl: secs(config.worker.audio_ttl_secs),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&ChimeConfig::default())
    }
}

/// Longest TTL honored; larger configured values are clamped.
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

fn secs(n: u64) -> Duration {
    Duration::seconds(i64::try_from(n.min(MAX_TTL_SECS)).unwrap_or(0))
}

/// The services the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ReminderStore>,
    pub scheduler: Arc<dyn TaskScheduler>,
    pub speech: Arc<dyn SpeechAdapter>,
    /// `None` when no sunset provider is configured.
    pub sunset: Option<Arc<dyn SunsetAdapter>>,
    pub sink: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
}

/// What the caller plays back.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub command: Command,
    pub text: String,
    pub audio: Vec<u8>,
}

pub struct Engine {
    pub(crate) store: Arc<dyn ReminderStore>,
    pub(crate) scheduler: Arc<dyn TaskScheduler>,
    pub(crate) speech: Arc<dyn SpeechAdapter>,
    pub(crate) sunset: Option<Arc<dyn SunsetAdapter>>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locks: UserLocks,
    pub(crate) audio: AudioCache,
    pub(crate) settings: EngineSettings,
}

impl Engine {
    pub fn new(collaborators: Collaborators, settings: EngineSettings) -> Self {
        let Collaborators {
            store,
            scheduler,
            speech,
            sunset,
            sink,
            clock,
        } = collaborators;
        Self {
            store,
            scheduler,
            speech,
            sunset,
            sink,
            clock,
            locks: UserLocks::new(),
            audio: AudioCache::new(settings.audio_ttl),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Interprets one utterance and executes it.
    ///
    /// Blank transcripts are answered without dispatch or audit. Errors are
    /// collaborator or storage failures; the audit row, when one was
    /// written, is marked failed.
    pub async fn handle_utterance(
        &self,
        user_id: UserId,
        transcript: &str,
    ) -> Result<Reply, ChimeError> {
        let user = self.user(user_id).await?;
        let transcript = truncate_chars(transcript.trim(), self.settings.max_transcript_chars);
        if transcript.is_empty() {
            let audio = self.synthesize(&user, texts::BLANK_TRANSCRIPT).await?;
            return Ok(Reply {
                command: Command::unknown(),
                text: texts::BLANK_TRANSCRIPT.to_string(),
                audio,
            });
        }

        let guard = self.locks.lock(user_id).await;
        let now = self.clock.now();

        let purged = self.store.purge_expired_interactions(user_id, now).await?;
        if purged > 0 {
            debug!(user_id = %user_id, purged, "expired interactions purged");
        }
        let pending = self.store.active_pending_interaction(user_id, now).await?;
        let registry = PhraseRegistry::load(self.store.as_ref(), user_id).await?;
        let state = ConversationState::from_pending(pending.as_ref());
        let (transition, command) = resolve(&state, transcript, &registry);
        self.apply_transition(user_id, transition, now).await?;

        let intent = command.intent().to_string();
        let audit_id = self
            .store
            .record_voice_command(user_id, transcript, &intent, &command.params())
            .await?;

        let text = match self.respond(&user, &command, &registry, now).await {
            Ok(text) => text,
            Err(e) => {
                self.finish_audit(audit_id, VoiceCommandStatus::Failed).await;
                return Err(e);
            }
        };
        drop(guard);

        let audio = match self.synthesize(&user, &text).await {
            Ok(audio) => audio,
            Err(e) => {
                self.finish_audit(audit_id, VoiceCommandStatus::Failed).await;
                return Err(e);
            }
        };
        self.finish_audit(audit_id, VoiceCommandStatus::Processed)
            .await;

        info!(user_id = %user_id, intent = %intent, "utterance handled");
        Ok(Reply {
            command,
            text,
            audio,
        })
    }

    async fn apply_transition(
        &self,
        user_id: UserId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<(), ChimeError> {
        match transition {
            Transition::Stay => {}
            Transition::Complete(id) => {
                self.store.destroy_pending_interaction(user_id, id).await?;
            }
            Transition::Refresh(id) => {
                self.store
                    .refresh_pending_interaction(user_id, id, now + self.settings.interaction_ttl)
                    .await?;
            }
        }
        Ok(())
    }

    async fn finish_audit(&self, id: VoiceCommandId, status: VoiceCommandStatus) {
        if let Err(e) = self.store.update_voice_command_status(id, status).await {
            warn!(voice_command_id = %id, error = %e, "failed to update voice command status");
        }
    }

    pub(crate) async fn user(&self, user_id: UserId) -> Result<User, ChimeError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(ChimeError::UserNotFound(user_id))
    }

    pub(crate) async fn synthesize(&self, user: &User, text: &str) -> Result<Vec<u8>, ChimeError> {
        let voice_id = user
            .voice_id
            .as_deref()
            .unwrap_or(&self.settings.default_voice_id);
        self.speech.synthesize(text, voice_id).await
    }

    // --- Listing and management ---

    /// Pending entries of one kind that have not fired yet. Daily reminders
    /// are ordered by local time of day, the rest by fire time.
    pub async fn pending_entries(
        &self,
        user_id: UserId,
        kind: EntryKind,
    ) -> Result<Vec<ScheduleEntry>, ChimeError> {
        let mut entries = self
            .store
            .pending_schedule_entries(user_id, Some(kind), self.clock.now())
            .await?;
        if kind == EntryKind::Daily {
            let tz = self.user(user_id).await?.tz()?;
            entries.sort_by_key(|e| entry_sort_key(e, tz));
        }
        Ok(entries)
    }

    /// Every loop by number, each with its aliases.
    pub async fn loops_with_aliases(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(LoopingReminder, Vec<CommandAlias>)>, ChimeError> {
        let loops = self.store.list_loops(user_id).await?;
        let mut aliases = self.store.list_aliases(user_id).await?;
        Ok(loops
            .into_iter()
            .map(|lr| {
                let (own, rest): (Vec<_>, Vec<_>) = aliases
                    .drain(..)
                    .partition(|a| a.looping_reminder_id == lr.id);
                aliases = rest;
                (lr, own)
            })
            .collect())
    }

    /// Cancels a pending entry. Returns `false` when it was not pending.
    pub async fn cancel_entry(&self, user_id: UserId, id: EntryId) -> Result<bool, ChimeError> {
        let _guard = self.locks.lock(user_id).await;
        let cancelled = self.store.cancel_schedule_entry(user_id, id).await?;
        if cancelled {
            self.sink.notify(Notification::Removed {
                user_id,
                item: ItemRef::Entry(id),
            });
            info!(user_id = %user_id, entry_id = %id, "schedule entry cancelled");
        }
        Ok(cancelled)
    }

    /// Deletes a loop and its aliases. Queued re-fires become no-ops.
    pub async fn delete_loop(&self, user_id: UserId, number: i64) -> Result<bool, ChimeError> {
        let _guard = self.locks.lock(user_id).await;
        let Some(lr) = self.store.find_loop_by_number(user_id, number).await? else {
            return Ok(false);
        };
        let deleted = self.store.delete_looping_reminder(user_id, lr.id).await?;
        if deleted {
            self.sink.notify(Notification::Removed {
                user_id,
                item: ItemRef::Loop(lr.id),
            });
            info!(user_id = %user_id, number, "looping reminder deleted");
        }
        Ok(deleted)
    }

    /// Alert audio referenced by a voice alert notification.
    pub fn cached_audio(&self, token: &str) -> Option<Arc<Vec<u8>>> {
        self.audio.get(token, self.clock.now())
    }

    pub fn purge_audio(&self) -> usize {
        self.audio.purge(self.clock.now())
    }
}

/// At most `max` characters of `s`, cut on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("ab cd", 3), "ab");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn settings_follow_config() {
        let mut config = ChimeConfig::default();
        config.engine.interaction_ttl_secs = 120;
        config.speech.default_voice_id = "voice-x".into();
        let settings = EngineSettings::from_config(&config);
        assert_eq!(settings.interaction_ttl, Duration::minutes(2));
        assert_eq!(settings.default_voice_id, "voice-x");
        assert_eq!(settings.audio_ttl, Duration::minutes(5));
        assert_eq!(settings.max_transcript_chars, 1000);
    }
}
