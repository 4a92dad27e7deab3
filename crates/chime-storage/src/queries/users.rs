// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD operations.

use chime_core::ChimeError;
use chime_core::types::{NewUser, User, UserId};
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::time;

const COLUMNS: &str = "id, name, timezone, voice_id, latitude, longitude, created_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        timezone: row.get(2)?,
        voice_id: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        created_at: time::column(row, 6)?,
    })
}

/// Insert a user and return the stored row.
pub async fn create_user(db: &Database, user: NewUser) -> Result<User, ChimeError> {
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (name, timezone, voice_id, latitude, longitude, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.name,
                    user.timezone,
                    user.voice_id,
                    user.latitude,
                    user.longitude,
                    created_at
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_user(db: &Database, id: UserId) -> Result<Option<User>, ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_users(db: &Database) -> Result<Vec<User>, ChimeError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<User>> {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))?;
            let users = stmt
                .query_map([], row_to_user)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}
