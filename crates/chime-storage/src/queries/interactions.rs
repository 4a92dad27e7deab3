// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending interaction operations.
//!
//! The context is stored as tagged JSON; the `kind` column duplicates the tag
//! for inspection from the sqlite shell.

use chime_core::ChimeError;
use chime_core::types::{InteractionId, NewPendingInteraction, PendingInteraction, UserId};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::time;

const COLUMNS: &str = "id, user_id, context, expires_at, created_at";

fn row_to_interaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingInteraction> {
    let context: String = row.get(2)?;
    Ok(PendingInteraction {
        id: InteractionId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        context: serde_json::from_str(&context)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        expires_at: time::column(row, 3)?,
        created_at: time::column(row, 4)?,
    })
}

/// The oldest interaction still active at `now`.
pub async fn active_interaction(
    db: &Database,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<Option<PendingInteraction>, ChimeError> {
    let now = time::to_sql(now);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM pending_interactions
                     WHERE user_id = ?1 AND expires_at > ?2
                     ORDER BY id ASC LIMIT 1"
                ),
                params![user_id.0, now],
                row_to_interaction,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_interaction(
    db: &Database,
    new: NewPendingInteraction,
) -> Result<PendingInteraction, ChimeError> {
    let kind = new.context.kind().to_string();
    let context = serde_json::to_string(&new.context).map_err(|e| ChimeError::Storage {
        source: Box::new(e),
    })?;
    let expires_at = time::to_sql(new.expires_at);
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<PendingInteraction> {
            conn.execute(
                "INSERT INTO pending_interactions (user_id, kind, context, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![new.user_id.0, kind, context, expires_at, created_at],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM pending_interactions WHERE id = ?1"),
                params![id],
                row_to_interaction,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn destroy_interaction(
    db: &Database,
    user_id: UserId,
    id: InteractionId,
) -> Result<bool, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "DELETE FROM pending_interactions WHERE id = ?1 AND user_id = ?2",
                params![id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Moves the expiry of an interaction forward.
pub async fn refresh_interaction(
    db: &Database,
    user_id: UserId,
    id: InteractionId,
    expires_at: DateTime<Utc>,
) -> Result<bool, ChimeError> {
    let expires_at = time::to_sql(expires_at);
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE pending_interactions SET expires_at = ?1 WHERE id = ?2 AND user_id = ?3",
                params![expires_at, id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes every interaction that expired at or before `now`.
pub async fn purge_expired(
    db: &Database,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<usize, ChimeError> {
    let now = time::to_sql(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM pending_interactions WHERE user_id = ?1 AND expires_at <= ?2",
                params![user_id.0, now],
            )
        })
        .await
        .map_err(map_tr_err)
}
