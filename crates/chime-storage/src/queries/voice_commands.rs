// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice command audit log.

use chime_core::ChimeError;
use chime_core::types::{UserId, VoiceCommand, VoiceCommandId, VoiceCommandStatus};
use chrono::Utc;
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{Database, map_tr_err};
use crate::time;

/// Records a received utterance with its classified intent and parameters.
pub async fn record(
    db: &Database,
    user_id: UserId,
    transcript: &str,
    intent: &str,
    params: &serde_json::Value,
) -> Result<VoiceCommandId, ChimeError> {
    let transcript = transcript.to_string();
    let intent = intent.to_string();
    let params = params.to_string();
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<VoiceCommandId> {
            conn.execute(
                "INSERT INTO voice_commands (user_id, transcript, intent, params, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'received', ?5)",
                params![user_id.0, transcript, intent, params, created_at],
            )?;
            Ok(VoiceCommandId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_status(
    db: &Database,
    id: VoiceCommandId,
    status: VoiceCommandStatus,
) -> Result<(), ChimeError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "UPDATE voice_commands SET status = ?1 WHERE id = ?2",
                params![status, id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The user's most recent commands, newest first.
pub async fn recent(
    db: &Database,
    user_id: UserId,
    limit: usize,
) -> Result<Vec<VoiceCommand>, ChimeError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<VoiceCommand>> {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, transcript, intent, params, status, created_at
                 FROM voice_commands WHERE user_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )?;
            let commands = stmt
                .query_map(params![user_id.0, limit], |row| {
                    let params: String = row.get(4)?;
                    Ok(VoiceCommand {
                        id: VoiceCommandId(row.get(0)?),
                        user_id: UserId(row.get(1)?),
                        transcript: row.get(2)?,
                        intent: row.get(3)?,
                        params: serde_json::from_str(&params).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
                        })?,
                        status: time::enum_column(row, 5)?,
                        created_at: time::column(row, 6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(commands)
        })
        .await
        .map_err(map_tr_err)
}
