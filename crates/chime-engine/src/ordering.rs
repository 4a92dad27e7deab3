// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where a newly created item lands in its live-view list.

use chime_core::types::{EntryKind, ScheduleEntry};
use chime_core::{ItemRef, Position};
use chrono_tz::Tz;

use crate::schedule::minutes_of_day;

/// Sort key of a schedule entry within its list.
///
/// Timers and one-shot reminders sort by absolute fire time; daily reminders
/// sort by local time of day, so the list reads like a daily agenda.
pub fn entry_sort_key(entry: &ScheduleEntry, tz: Tz) -> i64 {
    match entry.kind {
        EntryKind::Daily => i64::from(minutes_of_day(tz, entry.fire_at)),
        EntryKind::Timer | EntryKind::OneShot => entry.fire_at.timestamp_millis(),
    }
}

/// Position of a new item with `key` among `siblings` (the new item itself
/// excluded): before the first sibling, in key order, whose key is strictly
/// greater; otherwise at the end.
pub fn insertion_position<K: Ord>(
    key: &K,
    siblings: impl IntoIterator<Item = (ItemRef, K)>,
) -> Position {
    let mut siblings: Vec<(ItemRef, K)> = siblings.into_iter().collect();
    siblings.sort_by(|a, b| a.1.cmp(&b.1));
    siblings
        .into_iter()
        .find(|(_, sibling)| sibling > key)
        .map_or(Position::Append, |(anchor, _)| Position::InsertBefore {
            anchor,
        })
}

/// Position of `entry` among `pending`, the user's pending entries of the
/// same kind.
pub fn entry_position(entry: &ScheduleEntry, pending: &[ScheduleEntry], tz: Tz) -> Position {
    let siblings = pending
        .iter()
        .filter(|s| s.id != entry.id && s.kind == entry.kind)
        .map(|s| (ItemRef::Entry(s.id), entry_sort_key(s, tz)));
    insertion_position(&entry_sort_key(entry, tz), siblings)
}
