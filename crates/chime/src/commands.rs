// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command writes its human-facing output to `out` so tests can read
//! it back.

use std::io::Write;
use std::path::Path;

use chime_core::types::{
    CommandAlias, EntryId, EntryKind, LoopingReminder, NewUser, ScheduleEntry, User,
    parse_timezone,
};
use chime_core::{ChimeError, ReminderStore, UserId};
use chime_engine::Engine;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::info;

fn io_err(e: std::io::Error) -> ChimeError {
    ChimeError::Internal(format!("failed to write output: {e}"))
}

/// `chime say`: interprets one utterance and prints the reply.
pub async fn say(
    engine: &Engine,
    user_id: UserId,
    transcript: &str,
    audio_out: Option<&Path>,
    out: &mut impl Write,
) -> Result<(), ChimeError> {
    let reply = engine.handle_utterance(user_id, transcript).await?;
    writeln!(out, "{}", reply.text).map_err(io_err)?;

    if let Some(path) = audio_out {
        tokio::fs::write(path, &reply.audio)
            .await
            .map_err(|e| ChimeError::Internal(format!("failed to write {}: {e}", path.display())))?;
        info!(path = %path.display(), bytes = reply.audio.len(), "reply audio written");
    }
    Ok(())
}

/// `chime user add`.
pub async fn add_user(
    store: &dyn ReminderStore,
    new_user: NewUser,
    out: &mut impl Write,
) -> Result<User, ChimeError> {
    parse_timezone(&new_user.timezone)?;
    if new_user.latitude.is_some() != new_user.longitude.is_some() {
        return Err(ChimeError::Config(
            "latitude and longitude must be given together".into(),
        ));
    }
    let user = store.create_user(new_user).await?;
    writeln!(
        out,
        "Created user {} ({}, {})",
        user.id, user.name, user.timezone
    )
    .map_err(io_err)?;
    Ok(user)
}

/// `chime user list`.
pub async fn list_users(store: &dyn ReminderStore, out: &mut impl Write) -> Result<(), ChimeError> {
    for user in store.list_users().await? {
        let location = user
            .location()
            .map(|(lat, lng)| format!("\t{lat},{lng}"))
            .unwrap_or_default();
        writeln!(out, "{}\t{}\t{}{}", user.id, user.name, user.timezone, location)
            .map_err(io_err)?;
    }
    Ok(())
}

/// A looping reminder with its alias phrases, as printed by `chime list --json`.
#[derive(Debug, Serialize)]
struct LoopView {
    #[serde(flatten)]
    looping: LoopingReminder,
    aliases: Vec<String>,
}

/// Everything `chime list` shows for one user.
#[derive(Debug, Serialize)]
struct Listing {
    timers: Vec<ScheduleEntry>,
    reminders: Vec<ScheduleEntry>,
    daily_reminders: Vec<ScheduleEntry>,
    looping_reminders: Vec<LoopView>,
}

impl Listing {
    async fn load(engine: &Engine, user_id: UserId) -> Result<Self, ChimeError> {
        let looping_reminders = engine
            .loops_with_aliases(user_id)
            .await?
            .into_iter()
            .map(|(looping, aliases)| LoopView {
                looping,
                aliases: aliases.into_iter().map(|a: CommandAlias| a.phrase).collect(),
            })
            .collect();
        Ok(Self {
            timers: engine.pending_entries(user_id, EntryKind::Timer).await?,
            reminders: engine.pending_entries(user_id, EntryKind::OneShot).await?,
            daily_reminders: engine.pending_entries(user_id, EntryKind::Daily).await?,
            looping_reminders,
        })
    }
}

/// `chime list`: pending timers and reminders, then looping reminders.
pub async fn list(
    engine: &Engine,
    store: &dyn ReminderStore,
    user_id: UserId,
    json: bool,
    out: &mut impl Write,
) -> Result<(), ChimeError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(ChimeError::UserNotFound(user_id))?;
    let tz = user.tz()?;
    let listing = Listing::load(engine, user_id).await?;

    if json {
        let text = serde_json::to_string_pretty(&listing)
            .map_err(|e| ChimeError::Internal(format!("failed to encode listing: {e}")))?;
        writeln!(out, "{text}").map_err(io_err)?;
        return Ok(());
    }

    write_entries(out, "Timers", &listing.timers, tz, "%-I:%M:%S %p")?;
    write_entries(out, "Reminders", &listing.reminders, tz, "%a %b %-d, %-I:%M %p")?;
    write_entries(out, "Daily reminders", &listing.daily_reminders, tz, "%-I:%M %p")?;

    writeln!(out, "Looping reminders").map_err(io_err)?;
    if listing.looping_reminders.is_empty() {
        writeln!(out, "  (none)").map_err(io_err)?;
    }
    for view in &listing.looping_reminders {
        let lr = &view.looping;
        let state = if lr.active { "running" } else { "stopped" };
        write!(
            out,
            "  {}. every {} min: '{}' until '{}' [{state}]",
            lr.number, lr.interval_minutes, lr.message, lr.stop_phrase
        )
        .map_err(io_err)?;
        if !view.aliases.is_empty() {
            write!(out, " aliases: {}", view.aliases.join(", ")).map_err(io_err)?;
        }
        writeln!(out).map_err(io_err)?;
    }
    Ok(())
}

fn write_entries(
    out: &mut impl Write,
    heading: &str,
    entries: &[ScheduleEntry],
    tz: Tz,
    time_format: &str,
) -> Result<(), ChimeError> {
    writeln!(out, "{heading}").map_err(io_err)?;
    if entries.is_empty() {
        writeln!(out, "  (none)").map_err(io_err)?;
    }
    for entry in entries {
        let local = entry.fire_at.with_timezone(&tz).format(time_format);
        writeln!(out, "  #{}  {local}  {}", entry.id, entry.message).map_err(io_err)?;
    }
    Ok(())
}

/// `chime cancel`: cancels a pending timer or reminder.
pub async fn cancel(
    engine: &Engine,
    user_id: UserId,
    entry_id: EntryId,
    out: &mut impl Write,
) -> Result<bool, ChimeError> {
    let cancelled = engine.cancel_entry(user_id, entry_id).await?;
    if cancelled {
        writeln!(out, "Cancelled #{entry_id}").map_err(io_err)?;
    } else {
        writeln!(out, "No pending timer or reminder #{entry_id}").map_err(io_err)?;
    }
    Ok(cancelled)
}

/// `chime loops delete`.
pub async fn delete_loop(
    engine: &Engine,
    user_id: UserId,
    number: i64,
    out: &mut impl Write,
) -> Result<bool, ChimeError> {
    let deleted = engine.delete_loop(user_id, number).await?;
    if deleted {
        writeln!(out, "Deleted looping reminder {number}").map_err(io_err)?;
    } else {
        writeln!(out, "No looping reminder {number}").map_err(io_err)?;
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use chime_test_utils::TestHarness;

    use super::*;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn say_prints_reply_and_writes_audio() {
        let h = TestHarness::new().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("reply.mp3");

        let mut out = Vec::new();
        say(
            &h.engine,
            h.user.id,
            "set a timer for 5 minutes",
            Some(&audio_path),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(output(out), "Timer set for 5 minutes\n");
        assert_eq!(std::fs::read(&audio_path).unwrap(), b"Timer set for 5 minutes");
    }

    #[tokio::test]
    async fn add_user_rejects_unknown_timezone() {
        let h = TestHarness::new().await.unwrap();
        let mut out = Vec::new();
        let err = add_user(
            h.storage.as_ref(),
            NewUser {
                name: "Grace".into(),
                timezone: "Mars/Olympus_Mons".into(),
                voice_id: None,
                latitude: None,
                longitude: None,
            },
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChimeError::Config(_)));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn add_and_list_users() {
        let h = TestHarness::new().await.unwrap();
        let mut out = Vec::new();
        let grace = add_user(
            h.storage.as_ref(),
            NewUser {
                name: "Grace".into(),
                timezone: "Europe/London".into(),
                voice_id: None,
                latitude: Some(51.5),
                longitude: Some(-0.12),
            },
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(
            output(out),
            format!("Created user {} (Grace, Europe/London)\n", grace.id)
        );

        let mut out = Vec::new();
        list_users(h.storage.as_ref(), &mut out).await.unwrap();
        let text = output(out);
        assert!(text.contains("Ada\tAmerica/New_York\n"), "got: {text}");
        assert!(text.contains("Grace\tEurope/London\t51.5,-0.12\n"), "got: {text}");
    }

    #[tokio::test]
    async fn list_shows_entries_in_local_time() {
        let h = TestHarness::new().await.unwrap();
        h.say("set a timer for 5 minutes").await.unwrap();
        h.say("daily reminder at 9 pm to stretch").await.unwrap();
        h.say("set a looping reminder for 5 minutes saying drink water until I say done drinking")
            .await
            .unwrap();
        h.say("alias loop 1 as water please").await.unwrap();

        let mut out = Vec::new();
        list(&h.engine, h.storage.as_ref(), h.user.id, false, &mut out)
            .await
            .unwrap();
        let text = output(out);

        assert!(text.contains("Timer finished after 5 minutes"), "got: {text}");
        assert!(text.contains("2:16:00 PM"), "got: {text}");
        assert!(text.contains("Reminders\n  (none)\n"), "got: {text}");
        assert!(text.contains("9:00 PM  stretch"), "got: {text}");
        assert!(
            text.contains(
                "1. every 5 min: 'drink water' until 'done drinking' [running] aliases: water please"
            ),
            "got: {text}"
        );
    }

    #[tokio::test]
    async fn list_json_has_every_section() {
        let h = TestHarness::new().await.unwrap();
        h.say("set a timer for 5 minutes").await.unwrap();

        let mut out = Vec::new();
        list(&h.engine, h.storage.as_ref(), h.user.id, true, &mut out)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["timers"].as_array().unwrap().len(), 1);
        assert!(value["reminders"].as_array().unwrap().is_empty());
        assert!(value["daily_reminders"].as_array().unwrap().is_empty());
        assert!(value["looping_reminders"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_for_unknown_user_fails() {
        let h = TestHarness::new().await.unwrap();
        let mut out = Vec::new();
        let err = list(&h.engine, h.storage.as_ref(), UserId(404), false, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, ChimeError::UserNotFound(UserId(404))));
    }

    #[tokio::test]
    async fn cancel_and_delete_report_outcome() {
        let h = TestHarness::new().await.unwrap();
        h.say("set a timer for 5 minutes").await.unwrap();
        h.say("set a looping reminder for 5 minutes saying drink water until I say done drinking")
            .await
            .unwrap();
        let timer = h
            .engine
            .pending_entries(h.user.id, EntryKind::Timer)
            .await
            .unwrap()
            .remove(0);

        let mut out = Vec::new();
        assert!(cancel(&h.engine, h.user.id, timer.id, &mut out).await.unwrap());
        assert!(!cancel(&h.engine, h.user.id, timer.id, &mut out).await.unwrap());
        assert!(delete_loop(&h.engine, h.user.id, 1, &mut out).await.unwrap());
        assert!(!delete_loop(&h.engine, h.user.id, 1, &mut out).await.unwrap());

        assert_eq!(
            output(out),
            format!(
                "Cancelled #{id}\nNo pending timer or reminder #{id}\n\
                 Deleted looping reminder 1\nNo looping reminder 1\n",
                id = timer.id
            )
        );
    }
}
