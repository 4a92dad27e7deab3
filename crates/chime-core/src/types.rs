// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the parser, engine, and storage layers.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ChimeError;

/// Shortest interval a looping reminder may repeat at, in minutes.
pub const MIN_LOOP_INTERVAL_MINUTES: u32 = 1;

/// Longest interval a looping reminder may repeat at (one day), in minutes.
pub const MAX_LOOP_INTERVAL_MINUTES: u32 = 1440;

/// Maximum length of a stop phrase or alias phrase, in characters.
pub const MAX_PHRASE_CHARS: usize = 100;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for a user.
    UserId
);
id_type!(
    /// Unique identifier for a schedule entry.
    EntryId
);
id_type!(
    /// Unique identifier for a looping reminder (not its user-facing number).
    LoopId
);
id_type!(
    /// Unique identifier for a command alias.
    AliasId
);
id_type!(
    /// Unique identifier for a pending interaction.
    InteractionId
);
id_type!(
    /// Unique identifier for an audited voice command.
    VoiceCommandId
);

/// A person whose utterances are interpreted and whose reminders are scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// IANA timezone name, e.g. `America/New_York`.
    pub timezone: String,
    /// Voice used for synthesized replies; falls back to the configured default.
    pub voice_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Parses the user's timezone.
    pub fn tz(&self) -> Result<Tz, ChimeError> {
        parse_timezone(&self.timezone)
    }

    /// Returns `(latitude, longitude)` when both are known.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Attributes for creating a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub timezone: String,
    pub voice_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, ChimeError> {
    name.parse::<Tz>()
        .map_err(|_| ChimeError::Config(format!("unknown timezone `{name}`")))
}

/// What kind of schedule entry this is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    OneShot,
    Daily,
    Timer,
}

/// Lifecycle state of a schedule entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Delivered,
    Cancelled,
}

/// A persisted reminder, timer, or daily reminder occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub kind: EntryKind,
    pub message: String,
    pub fire_at: DateTime<Utc>,
    pub recurs_daily: bool,
    pub status: EntryStatus,
    /// The daily entry this occurrence was chained from.
    pub previous_id: Option<EntryId>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Checks that `recurs_daily` agrees with `kind`.
    pub fn check_invariants(&self) -> Result<(), ChimeError> {
        if self.recurs_daily != (self.kind == EntryKind::Daily) {
            return Err(ChimeError::InvariantViolation(format!(
                "schedule entry {} has kind {} but recurs_daily = {}",
                self.id, self.kind, self.recurs_daily
            )));
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }
}

/// Attributes for creating a schedule entry. `recurs_daily` is derived from
/// the kind and cannot be set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScheduleEntry {
    pub user_id: UserId,
    pub kind: EntryKind,
    pub message: String,
    pub fire_at: DateTime<Utc>,
}

impl NewScheduleEntry {
    pub fn recurs_daily(&self) -> bool {
        self.kind == EntryKind::Daily
    }
}

/// A repeat-until-acknowledged prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopingReminder {
    pub id: LoopId,
    pub user_id: UserId,
    /// User-facing sequence number, unique per user.
    pub number: i64,
    pub interval_minutes: u32,
    pub message: String,
    pub stop_phrase: String,
    pub active: bool,
    /// Incremented on every inactive to active transition.
    pub generation: i64,
    pub created_at: DateTime<Utc>,
}

/// Attributes for creating a looping reminder. The number is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoopingReminder {
    pub user_id: UserId,
    pub interval_minutes: u32,
    pub message: String,
    pub stop_phrase: String,
}

/// A shortcut phrase that runs a looping reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAlias {
    pub id: AliasId,
    pub user_id: UserId,
    pub looping_reminder_id: LoopId,
    pub phrase: String,
    pub created_at: DateTime<Utc>,
}

/// What a pending interaction is waiting for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    StopPhraseReplacement,
    AliasPhraseReplacement,
}

/// Parameters of a looping reminder whose stop phrase collided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPhraseContext {
    pub interval_minutes: u32,
    pub message: String,
    pub original_stop_phrase: String,
}

/// Parameters of an alias whose phrase collided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasContext {
    pub looping_reminder_id: LoopId,
    pub original_phrase: String,
}

/// The in-progress operation a pending interaction will complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingContext {
    StopPhraseReplacement(StopPhraseContext),
    AliasPhraseReplacement(AliasContext),
}

impl PendingContext {
    pub fn kind(&self) -> InteractionKind {
        match self {
            PendingContext::StopPhraseReplacement(_) => InteractionKind::StopPhraseReplacement,
            PendingContext::AliasPhraseReplacement(_) => InteractionKind::AliasPhraseReplacement,
        }
    }
}

/// Short-lived multi-turn state awaiting the user's replacement phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInteraction {
    pub id: InteractionId,
    pub user_id: UserId,
    pub context: PendingContext,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PendingInteraction {
    pub fn kind(&self) -> InteractionKind {
        self.context.kind()
    }

    /// An interaction is active strictly before its expiry instant.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Attributes for creating a pending interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPendingInteraction {
    pub user_id: UserId,
    pub context: PendingContext,
    pub expires_at: DateTime<Utc>,
}

/// Processing state of an audited voice command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VoiceCommandStatus {
    Received,
    Processed,
    Failed,
}

/// Audit record of one interpreted utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommand {
    pub id: VoiceCommandId,
    pub user_id: UserId,
    pub transcript: String,
    pub intent: String,
    pub params: serde_json::Value,
    pub status: VoiceCommandStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn entry(kind: EntryKind, recurs_daily: bool) -> ScheduleEntry {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        ScheduleEntry {
            id: EntryId(1),
            user_id: UserId(1),
            kind,
            message: "stretch".into(),
            fire_at: at,
            recurs_daily,
            status: EntryStatus::Pending,
            previous_id: None,
            created_at: at,
        }
    }

    #[test]
    fn recurs_daily_must_match_kind() {
        assert!(entry(EntryKind::Daily, true).check_invariants().is_ok());
        assert!(entry(EntryKind::Timer, false).check_invariants().is_ok());
        assert!(matches!(
            entry(EntryKind::OneShot, true).check_invariants(),
            Err(ChimeError::InvariantViolation(_))
        ));
        assert!(matches!(
            entry(EntryKind::Daily, false).check_invariants(),
            Err(ChimeError::InvariantViolation(_))
        ));
    }

    #[test]
    fn enums_use_snake_case_names() {
        assert_eq!(EntryKind::OneShot.to_string(), "one_shot");
        assert_eq!(EntryKind::from_str("daily").unwrap(), EntryKind::Daily);
        assert_eq!(
            InteractionKind::AliasPhraseReplacement.to_string(),
            "alias_phrase_replacement"
        );
        assert_eq!(
            VoiceCommandStatus::from_str("processed").unwrap(),
            VoiceCommandStatus::Processed
        );
    }

    #[test]
    fn pending_context_json_carries_kind_tag() {
        let ctx = PendingContext::StopPhraseReplacement(StopPhraseContext {
            interval_minutes: 5,
            message: "have you done the dishes?".into(),
            original_stop_phrase: "doing the dishes".into(),
        });
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["kind"], "stop_phrase_replacement");
        assert_eq!(json["interval_minutes"], 5);
        let back: PendingContext = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), InteractionKind::StopPhraseReplacement);
    }

    #[test]
    fn interaction_expiry_is_exclusive() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let interaction = PendingInteraction {
            id: InteractionId(1),
            user_id: UserId(1),
            context: PendingContext::AliasPhraseReplacement(AliasContext {
                looping_reminder_id: LoopId(3),
                original_phrase: "dishes".into(),
            }),
            expires_at: created + chrono::Duration::minutes(5),
            created_at: created,
        };
        assert!(interaction.is_active_at(created + chrono::Duration::seconds(299)));
        assert!(!interaction.is_active_at(created + chrono::Duration::minutes(5)));
    }

    #[test]
    fn unknown_timezone_is_config_error() {
        assert!(parse_timezone("America/Chicago").is_ok());
        assert!(matches!(
            parse_timezone("Eastern Time (US & Canada)"),
            Err(ChimeError::Config(_))
        ));
    }
}
