// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-view notifications emitted by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{EntryId, EntryKind, LoopId, LoopingReminder, ScheduleEntry, UserId};

/// A list shown in the live view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListTarget {
    Timers,
    Reminders,
    DailyReminders,
    LoopingReminders,
}

impl From<EntryKind> for ListTarget {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Timer => ListTarget::Timers,
            EntryKind::OneShot => ListTarget::Reminders,
            EntryKind::Daily => ListTarget::DailyReminders,
        }
    }
}

/// Reference to a rendered list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Entry(EntryId),
    Loop(LoopId),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Entry(id) => write!(f, "reminder_{id}"),
            ItemRef::Loop(id) => write!(f, "looping_reminder_{id}"),
        }
    }
}

/// A rendered list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "item", rename_all = "snake_case")]
pub enum ListItem {
    Entry(ScheduleEntry),
    Loop(LoopingReminder),
}

impl ListItem {
    pub fn item_ref(&self) -> ItemRef {
        match self {
            ListItem::Entry(entry) => ItemRef::Entry(entry.id),
            ListItem::Loop(lr) => ItemRef::Loop(lr.id),
        }
    }
}

/// Where a new item goes in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Position {
    /// After every existing item.
    Append,
    /// Immediately before the given sibling.
    InsertBefore { anchor: ItemRef },
}

/// One-way event for the live view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// A new item was created.
    Inserted {
        user_id: UserId,
        target: ListTarget,
        position: Position,
        item: ListItem,
    },
    /// An existing item changed (loop started/stopped, alias added).
    Replaced { user_id: UserId, item: ListItem },
    /// An item left its list (delivered or cancelled).
    Removed { user_id: UserId, item: ItemRef },
    /// Audio ready for playback, cached under `token`.
    VoiceAlert {
        user_id: UserId,
        token: String,
        text: String,
    },
}

impl Notification {
    pub fn user_id(&self) -> UserId {
        match self {
            Notification::Inserted { user_id, .. }
            | Notification::Replaced { user_id, .. }
            | Notification::Removed { user_id, .. }
            | Notification::VoiceAlert { user_id, .. } => *user_id,
        }
    }
}
