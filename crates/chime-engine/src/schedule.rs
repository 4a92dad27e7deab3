// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock arithmetic in the user's timezone.

use chime_core::ChimeError;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Resolves a local date and time to an instant.
///
/// Times inside a DST gap move forward by an hour; times inside a fold take
/// the earlier of the two instants.
pub fn resolve_local(
    tz: Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Utc>, ChimeError> {
    let naive = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
        ChimeError::Internal(format!("invalid local time {hour:02}:{minute:02}"))
    })?;
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    };
    local
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ChimeError::Internal(format!("{naive} does not exist in {tz}")))
}

/// The first instant at local `hour:minute` strictly after `now`, and
/// whether it falls on a later local date than `now`.
pub fn next_local_occurrence(
    tz: Tz,
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
) -> Result<(DateTime<Utc>, bool), ChimeError> {
    let today = now.with_timezone(&tz).date_naive();
    let candidate = resolve_local(tz, today, hour, minute)?;
    if candidate > now {
        return Ok((candidate, false));
    }
    let tomorrow = today
        .succ_opt()
        .ok_or_else(|| ChimeError::Internal("date out of range".into()))?;
    Ok((resolve_local(tz, tomorrow, hour, minute)?, true))
}

/// The same local wall-clock time on the calendar day after `previous`.
///
/// Across a DST change the UTC gap differs from 24 hours.
pub fn next_day_same_local_time(
    tz: Tz,
    previous: DateTime<Utc>,
) -> Result<DateTime<Utc>, ChimeError> {
    let local = previous.with_timezone(&tz);
    let next = local
        .date_naive()
        .succ_opt()
        .ok_or_else(|| ChimeError::Internal("date out of range".into()))?;
    resolve_local(tz, next, local.hour(), local.minute())
}

/// Minutes past local midnight.
pub fn minutes_of_day(tz: Tz, instant: DateTime<Utc>) -> u32 {
    let local = instant.with_timezone(&tz);
    local.hour() * 60 + local.minute()
}

/// Local `(hour, minute)` of an instant.
pub fn local_hour_minute(tz: Tz, instant: DateTime<Utc>) -> (u32, u32) {
    let local = instant.with_timezone(&tz);
    (local.hour(), local.minute())
}
