// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command execution. Runs under the user's lock.

use chime_core::types::{
    AliasContext, EntryKind, InteractionKind, LoopId, LoopingReminder, MAX_LOOP_INTERVAL_MINUTES,
    MAX_PHRASE_CHARS, MIN_LOOP_INTERVAL_MINUTES, NewLoopingReminder, NewPendingInteraction,
    NewScheduleEntry, PendingContext, ScheduleEntry, StopPhraseContext, User,
};
use chime_core::{
    ChimeError, Command, ItemRef, ListItem, ListTarget, Notification, PendingCompletion,
    ReminderSpec, ScheduledTask, UnknownReason,
};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::ordering::{entry_position, insertion_position};
use crate::registry::PhraseRegistry;
use crate::schedule::{local_hour_minute, next_local_occurrence};
use crate::texts;

impl Engine {
    /// Executes `command` and returns the reply text.
    pub(crate) async fn respond(
        &self,
        user: &User,
        command: &Command,
        registry: &PhraseRegistry,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        let tz = user.tz()?;
        match command {
            Command::TimeCheck => {
                let (hour, minute) = local_hour_minute(tz, now);
                Ok(texts::time_check(hour, minute))
            }
            Command::Sunset => self.sunset_today(user, tz, now).await,
            Command::Timer { minutes } => self.create_timer(user, tz, *minutes, now).await,
            Command::Reminder(spec) => {
                self.create_reminder(user, tz, EntryKind::OneShot, spec, now)
                    .await
            }
            Command::DailyReminder(spec) => {
                self.create_reminder(user, tz, EntryKind::Daily, spec, now)
                    .await
            }
            Command::CreateLoop {
                interval_minutes,
                message,
                stop_phrase,
            } => {
                self.create_loop(user, *interval_minutes, message, stop_phrase, registry, now)
                    .await
            }
            Command::CompletePending(PendingCompletion::StopPhrase {
                context,
                replacement_phrase,
            }) => {
                self.create_loop(
                    user,
                    context.interval_minutes,
                    &context.message,
                    replacement_phrase,
                    registry,
                    now,
                )
                .await
            }
            Command::RunLoop { number } => self.run_loop(user, *number, now).await,
            Command::StopLoop { loop_id } => self.stop_loop(user, *loop_id).await,
            Command::AliasLoop { number, phrase } => {
                match self.store.find_loop_by_number(user.id, *number).await? {
                    Some(lr) => self.add_alias(user, &lr, phrase, registry, now).await,
                    None => Ok(texts::loop_not_found(*number)),
                }
            }
            Command::CompletePending(PendingCompletion::Alias {
                context,
                replacement_phrase,
            }) => match self
                .store
                .find_loop(user.id, context.looping_reminder_id)
                .await?
            {
                Some(lr) => {
                    self.add_alias(user, &lr, replacement_phrase, registry, now)
                        .await
                }
                None => Ok(texts::LOOP_GONE.to_string()),
            },
            Command::GiveUp => Ok(texts::GIVE_UP.to_string()),
            Command::Unknown(UnknownReason::ReplacementPhraseTaken(kind)) => {
                Ok(texts::replacement_taken(*kind).to_string())
            }
            Command::Unknown(UnknownReason::NotUnderstood) => {
                Ok(texts::NOT_UNDERSTOOD.to_string())
            }
        }
    }

    async fn sunset_today(
        &self,
        user: &User,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        let Some((latitude, longitude)) = user.location() else {
            return Ok(texts::NO_LOCATION.to_string());
        };
        let Some(sunset) = &self.sunset else {
            return Ok(texts::SUNSET_UNAVAILABLE.to_string());
        };
        let today = now.with_timezone(&tz).date_naive();
        let at = sunset.sunset(latitude, longitude, today).await?;
        let (hour, minute) = local_hour_minute(tz, at);
        Ok(texts::sunset(hour, minute))
    }

    async fn create_timer(
        &self,
        user: &User,
        tz: Tz,
        minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        let entry = self
            .store
            .create_schedule_entry(NewScheduleEntry {
                user_id: user.id,
                kind: EntryKind::Timer,
                message: texts::timer_finished(minutes),
                fire_at: now + Duration::minutes(i64::from(minutes)),
            })
            .await?;
        self.schedule_entry(&entry, tz, now).await?;
        info!(user_id = %user.id, entry_id = %entry.id, minutes, "timer set");
        Ok(texts::timer_set(minutes))
    }

    async fn create_reminder(
        &self,
        user: &User,
        tz: Tz,
        kind: EntryKind,
        spec: &ReminderSpec,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        let (fire_at, tomorrow) = next_local_occurrence(tz, now, spec.hour, spec.minute)?;
        let entry = self
            .store
            .create_schedule_entry(NewScheduleEntry {
                user_id: user.id,
                kind,
                message: spec.message.clone(),
                fire_at,
            })
            .await?;
        self.schedule_entry(&entry, tz, now).await?;
        info!(
            user_id = %user.id,
            entry_id = %entry.id,
            kind = %kind,
            fire_at = %fire_at,
            "reminder scheduled"
        );
        Ok(match kind {
            EntryKind::Daily => {
                texts::daily_reminder_set(spec.hour, spec.minute, tomorrow, &spec.message)
            }
            EntryKind::OneShot | EntryKind::Timer => {
                texts::reminder_set(spec.hour, spec.minute, tomorrow, &spec.message)
            }
        })
    }

    /// Enqueues delivery of a new entry and announces it to the live view.
    pub(crate) async fn schedule_entry(
        &self,
        entry: &ScheduleEntry,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<(), ChimeError> {
        self.scheduler
            .enqueue_at(
                entry.fire_at,
                &ScheduledTask::DeliverReminder { entry_id: entry.id },
            )
            .await?;
        let pending = self
            .store
            .pending_schedule_entries(entry.user_id, Some(entry.kind), now)
            .await?;
        self.sink.notify(Notification::Inserted {
            user_id: entry.user_id,
            target: ListTarget::from(entry.kind),
            position: entry_position(entry, &pending, tz),
            item: ListItem::Entry(entry.clone()),
        });
        Ok(())
    }

    async fn create_loop(
        &self,
        user: &User,
        interval_minutes: u32,
        message: &str,
        stop_phrase: &str,
        registry: &PhraseRegistry,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        if !(MIN_LOOP_INTERVAL_MINUTES..=MAX_LOOP_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Ok(texts::LOOP_INTERVAL_OUT_OF_RANGE.to_string());
        }
        if stop_phrase.chars().count() > MAX_PHRASE_CHARS {
            return Ok(texts::STOP_PHRASE_TOO_LONG.to_string());
        }
        if registry.is_taken(stop_phrase) {
            self.await_replacement(
                user,
                PendingContext::StopPhraseReplacement(StopPhraseContext {
                    interval_minutes,
                    message: message.to_string(),
                    original_stop_phrase: stop_phrase.to_string(),
                }),
                now,
            )
            .await?;
            return Ok(texts::phrase_collision(
                InteractionKind::StopPhraseReplacement,
                stop_phrase,
            ));
        }

        let lr = self
            .store
            .create_looping_reminder(NewLoopingReminder {
                user_id: user.id,
                interval_minutes,
                message: message.to_string(),
                stop_phrase: stop_phrase.to_string(),
            })
            .await?;
        self.enqueue_first_refire(&lr, now).await?;

        let siblings = self
            .store
            .list_loops(user.id)
            .await?
            .into_iter()
            .filter(|other| other.id != lr.id)
            .map(|other| (ItemRef::Loop(other.id), other.number));
        self.sink.notify(Notification::Inserted {
            user_id: user.id,
            target: ListTarget::LoopingReminders,
            position: insertion_position(&lr.number, siblings),
            item: ListItem::Loop(lr.clone()),
        });
        info!(
            user_id = %user.id,
            number = lr.number,
            interval_minutes,
            "looping reminder created"
        );
        Ok(texts::loop_created(
            lr.number,
            interval_minutes,
            &lr.message,
            &lr.stop_phrase,
        ))
    }

    async fn run_loop(
        &self,
        user: &User,
        number: i64,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        let Some(lr) = self.store.find_loop_by_number(user.id, number).await? else {
            return Ok(texts::loop_not_found(number));
        };
        if lr.active {
            return Ok(texts::loop_already_running(number));
        }
        // Bump first: an active loop never shares a generation with re-fires
        // queued before it was stopped.
        if self.store.bump_loop_generation(user.id, lr.id).await?.is_none() {
            return Ok(texts::loop_not_found(number));
        }
        let Some(lr) = self.store.set_loop_active(user.id, lr.id, true).await? else {
            return Ok(texts::loop_not_found(number));
        };
        self.enqueue_first_refire(&lr, now).await?;
        self.sink.notify(Notification::Replaced {
            user_id: user.id,
            item: ListItem::Loop(lr.clone()),
        });
        info!(
            user_id = %user.id,
            number,
            generation = lr.generation,
            "looping reminder started"
        );
        Ok(texts::loop_running(number))
    }

    async fn stop_loop(
        &self,
        user: &User,
        loop_id: LoopId,
    ) -> Result<String, ChimeError> {
        let Some(lr) = self.store.set_loop_active(user.id, loop_id, false).await? else {
            return Ok(texts::LOOP_GONE.to_string());
        };
        self.sink.notify(Notification::Replaced {
            user_id: user.id,
            item: ListItem::Loop(lr.clone()),
        });
        info!(user_id = %user.id, number = lr.number, "looping reminder stopped");
        Ok(texts::loop_stopped(lr.number))
    }

    async fn add_alias(
        &self,
        user: &User,
        lr: &LoopingReminder,
        phrase: &str,
        registry: &PhraseRegistry,
        now: DateTime<Utc>,
    ) -> Result<String, ChimeError> {
        if phrase.chars().count() > MAX_PHRASE_CHARS {
            return Ok(texts::ALIAS_TOO_LONG.to_string());
        }
        if registry.is_taken(phrase) {
            self.await_replacement(
                user,
                PendingContext::AliasPhraseReplacement(AliasContext {
                    looping_reminder_id: lr.id,
                    original_phrase: phrase.to_string(),
                }),
                now,
            )
            .await?;
            return Ok(texts::phrase_collision(
                InteractionKind::AliasPhraseReplacement,
                phrase,
            ));
        }
        let alias = self.store.create_alias(user.id, lr.id, phrase).await?;
        self.sink.notify(Notification::Replaced {
            user_id: user.id,
            item: ListItem::Loop(lr.clone()),
        });
        info!(user_id = %user.id, number = lr.number, alias_id = %alias.id, "alias created");
        Ok(texts::alias_created(&alias.phrase, lr.number))
    }

    async fn await_replacement(
        &self,
        user: &User,
        context: PendingContext,
        now: DateTime<Utc>,
    ) -> Result<(), ChimeError> {
        let interaction = self
            .store
            .create_pending_interaction(NewPendingInteraction {
                user_id: user.id,
                context,
                expires_at: now + self.settings.interaction_ttl,
            })
            .await?;
        debug!(
            user_id = %user.id,
            interaction_id = %interaction.id,
            kind = %interaction.kind(),
            "waiting for replacement phrase"
        );
        Ok(())
    }

    async fn enqueue_first_refire(
        &self,
        lr: &LoopingReminder,
        now: DateTime<Utc>,
    ) -> Result<(), ChimeError> {
        let scheduled_fire_at = now + Duration::minutes(i64::from(lr.interval_minutes));
        self.scheduler
            .enqueue_at(
                scheduled_fire_at,
                &ScheduledTask::LoopRefire {
                    loop_id: lr.id,
                    scheduled_fire_at,
                    generation: lr.generation,
                },
            )
            .await?;
        Ok(())
    }
}
