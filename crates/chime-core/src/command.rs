// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structured command an utterance resolves to.

use serde_json::json;
use strum::{Display, EnumString};

use crate::types::{AliasContext, InteractionKind, LoopId, StopPhraseContext};

/// The classified purpose of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    TimeCheck,
    Sunset,
    Timer,
    Reminder,
    DailyReminder,
    CreateLoop,
    RunLoop,
    StopLoop,
    AliasLoop,
    CompletePending,
    GiveUp,
    Unknown,
}

/// A wall-clock time and message captured from a reminder utterance.
///
/// `hour` is already converted to the 24-hour clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSpec {
    pub hour: u32,
    pub minute: u32,
    pub message: String,
}

/// A pending interaction resolved with the user's replacement phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCompletion {
    StopPhrase {
        context: StopPhraseContext,
        replacement_phrase: String,
    },
    Alias {
        context: AliasContext,
        replacement_phrase: String,
    },
}

impl PendingCompletion {
    pub fn kind(&self) -> InteractionKind {
        match self {
            PendingCompletion::StopPhrase { .. } => InteractionKind::StopPhraseReplacement,
            PendingCompletion::Alias { .. } => InteractionKind::AliasPhraseReplacement,
        }
    }
}

/// Why an utterance produced no actionable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    /// No parser rule matched.
    NotUnderstood,
    /// The replacement phrase offered to a pending interaction is also taken.
    ReplacementPhraseTaken(InteractionKind),
}

/// One variant per intent, each carrying only its own fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TimeCheck,
    Sunset,
    Timer {
        minutes: u32,
    },
    Reminder(ReminderSpec),
    DailyReminder(ReminderSpec),
    CreateLoop {
        interval_minutes: u32,
        message: String,
        stop_phrase: String,
    },
    RunLoop {
        number: i64,
    },
    StopLoop {
        loop_id: LoopId,
    },
    AliasLoop {
        number: i64,
        phrase: String,
    },
    CompletePending(PendingCompletion),
    GiveUp,
    Unknown(UnknownReason),
}

impl Command {
    pub fn unknown() -> Self {
        Command::Unknown(UnknownReason::NotUnderstood)
    }

    pub fn intent(&self) -> Intent {
        match self {
            Command::TimeCheck => Intent::TimeCheck,
            Command::Sunset => Intent::Sunset,
            Command::Timer { .. } => Intent::Timer,
            Command::Reminder(_) => Intent::Reminder,
            Command::DailyReminder(_) => Intent::DailyReminder,
            Command::CreateLoop { .. } => Intent::CreateLoop,
            Command::RunLoop { .. } => Intent::RunLoop,
            Command::StopLoop { .. } => Intent::StopLoop,
            Command::AliasLoop { .. } => Intent::AliasLoop,
            Command::CompletePending(_) => Intent::CompletePending,
            Command::GiveUp => Intent::GiveUp,
            Command::Unknown(_) => Intent::Unknown,
        }
    }

    /// The command's parameters as a JSON object, as recorded in the audit log.
    pub fn params(&self) -> serde_json::Value {
        match self {
            Command::TimeCheck | Command::Sunset | Command::GiveUp => json!({}),
            Command::Timer { minutes } => json!({ "minutes": minutes }),
            Command::Reminder(spec) | Command::DailyReminder(spec) => json!({
                "hour": spec.hour,
                "minute": spec.minute,
                "message": spec.message,
            }),
            Command::CreateLoop {
                interval_minutes,
                message,
                stop_phrase,
            } => json!({
                "interval_minutes": interval_minutes,
                "message": message,
                "stop_phrase": stop_phrase,
            }),
            Command::RunLoop { number } => json!({ "number": number }),
            Command::StopLoop { loop_id } => json!({ "looping_reminder_id": loop_id }),
            Command::AliasLoop { number, phrase } => json!({ "target": number, "phrase": phrase }),
            Command::CompletePending(completion) => {
                let (mut params, replacement_phrase) = match completion {
                    PendingCompletion::StopPhrase {
                        context,
                        replacement_phrase,
                    } => (json!(context), replacement_phrase),
                    PendingCompletion::Alias {
                        context,
                        replacement_phrase,
                    } => (json!(context), replacement_phrase),
                };
                if let Some(map) = params.as_object_mut() {
                    map.insert("replacement_phrase".into(), json!(replacement_phrase));
                    map.insert("kind".into(), json!(completion.kind().to_string()));
                }
                params
            }
            Command::Unknown(UnknownReason::NotUnderstood) => json!({}),
            Command::Unknown(UnknownReason::ReplacementPhraseTaken(kind)) => json!({
                "error": "replacement_phrase_taken",
                "kind": kind.to_string(),
            }),
        }
    }
}
