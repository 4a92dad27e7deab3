// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule entry operations: reminders, timers and daily occurrences.

use chime_core::ChimeError;
use chime_core::types::{EntryId, EntryKind, NewScheduleEntry, ScheduleEntry, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::time;

const COLUMNS: &str =
    "id, user_id, kind, message, fire_at, recurs_daily, status, previous_id, created_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        id: EntryId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        kind: time::enum_column(row, 2)?,
        message: row.get(3)?,
        fire_at: time::column(row, 4)?,
        recurs_daily: row.get(5)?,
        status: time::enum_column(row, 6)?,
        previous_id: row.get::<_, Option<i64>>(7)?.map(EntryId),
        created_at: time::column(row, 8)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<ScheduleEntry>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM schedule_entries WHERE id = ?1"),
        params![id],
        row_to_entry,
    )
    .optional()
}

/// Insert a pending entry. `recurs_daily` follows the kind.
pub async fn create_entry(
    db: &Database,
    entry: NewScheduleEntry,
) -> Result<ScheduleEntry, ChimeError> {
    let recurs_daily = entry.recurs_daily();
    let fire_at = time::to_sql(entry.fire_at);
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<ScheduleEntry> {
            conn.execute(
                "INSERT INTO schedule_entries
                     (user_id, kind, message, fire_at, recurs_daily, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
                params![
                    entry.user_id.0,
                    entry.kind.to_string(),
                    entry.message,
                    fire_at,
                    recurs_daily,
                    created_at
                ],
            )?;
            let id = conn.last_insert_rowid();
            select_by_id(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_entry(db: &Database, id: EntryId) -> Result<Option<ScheduleEntry>, ChimeError> {
    db.connection()
        .call(move |conn| select_by_id(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// Pending entries firing strictly after `after`, ordered by fire time then id.
pub async fn pending_entries(
    db: &Database,
    user_id: UserId,
    kind: Option<EntryKind>,
    after: DateTime<Utc>,
) -> Result<Vec<ScheduleEntry>, ChimeError> {
    let kind = kind.map(|k| k.to_string());
    let after = time::to_sql(after);
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<ScheduleEntry>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM schedule_entries
                 WHERE user_id = ?1 AND status = 'pending' AND fire_at > ?2
                   AND (?3 IS NULL OR kind = ?3)
                 ORDER BY fire_at ASC, id ASC"
            ))?;
            let entries = stmt
                .query_map(params![user_id.0, after, kind], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Conditional `pending -> delivered`. Exactly one concurrent caller wins.
pub async fn mark_delivered(db: &Database, id: EntryId) -> Result<bool, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE schedule_entries SET status = 'delivered'
                 WHERE id = ?1 AND status = 'pending'",
                params![id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Conditional `pending -> cancelled`, scoped to the owning user.
pub async fn cancel_entry(db: &Database, user_id: UserId, id: EntryId) -> Result<bool, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE schedule_entries SET status = 'cancelled'
                 WHERE id = ?1 AND user_id = ?2 AND status = 'pending'",
                params![id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Creates the successor of `previous` at `fire_at`, or returns the existing
/// successor with `false`.
pub async fn create_recurrence(
    db: &Database,
    previous: EntryId,
    fire_at: DateTime<Utc>,
) -> Result<(ScheduleEntry, bool), ChimeError> {
    let fire_at = time::to_sql(fire_at);
    let created_at = time::to_sql(Utc::now());
    let result = db
        .connection()
        .call(move |conn| -> rusqlite::Result<Option<(ScheduleEntry, bool)>> {
            let tx = conn.transaction()?;
            let existing = tx
                .query_row(
                    &format!("SELECT {COLUMNS} FROM schedule_entries WHERE previous_id = ?1"),
                    params![previous.0],
                    row_to_entry,
                )
                .optional()?;
            if let Some(entry) = existing {
                tx.commit()?;
                return Ok(Some((entry, false)));
            }

            let inserted = tx.execute(
                "INSERT INTO schedule_entries
                     (user_id, kind, message, fire_at, recurs_daily, status, previous_id, created_at)
                 SELECT user_id, kind, message, ?2, recurs_daily, 'pending', id, ?3
                 FROM schedule_entries WHERE id = ?1",
                params![previous.0, fire_at, created_at],
            )?;
            if inserted == 0 {
                tx.commit()?;
                return Ok(None);
            }
            let id = tx.last_insert_rowid();
            let entry = select_by_id(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(Some((entry, true)))
        })
        .await
        .map_err(map_tr_err)?;

    result.ok_or_else(|| {
        ChimeError::InvariantViolation(format!(
            "cannot chain a recurrence from missing schedule entry {previous}"
        ))
    })
}
