// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command alias operations.

use chime_core::ChimeError;
use chime_core::types::{AliasId, CommandAlias, LoopId, UserId};
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_constraint_err, map_tr_err};
use crate::time;

const COLUMNS: &str = "id, user_id, looping_reminder_id, phrase, created_at";

fn row_to_alias(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommandAlias> {
    Ok(CommandAlias {
        id: AliasId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        looping_reminder_id: LoopId(row.get(2)?),
        phrase: row.get(3)?,
        created_at: time::column(row, 4)?,
    })
}

/// Case-insensitive exact phrase lookup.
pub async fn find_alias(
    db: &Database,
    user_id: UserId,
    phrase: &str,
) -> Result<Option<CommandAlias>, ChimeError> {
    let phrase = phrase.trim().to_lowercase();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM command_aliases
                     WHERE user_id = ?1 AND lower(phrase) = ?2"
                ),
                params![user_id.0, phrase],
                row_to_alias,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_alias(
    db: &Database,
    user_id: UserId,
    loop_id: LoopId,
    phrase: &str,
) -> Result<CommandAlias, ChimeError> {
    let phrase = phrase.trim().to_string();
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<CommandAlias> {
            conn.execute(
                "INSERT INTO command_aliases (user_id, looping_reminder_id, phrase, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id.0, loop_id.0, phrase, created_at],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM command_aliases WHERE id = ?1"),
                params![id],
                row_to_alias,
            )
        })
        .await
        .map_err(|e| map_constraint_err(e, "command alias"))
}

pub async fn list_aliases(db: &Database, user_id: UserId) -> Result<Vec<CommandAlias>, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<CommandAlias>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM command_aliases WHERE user_id = ?1 ORDER BY id ASC"
            ))?;
            let aliases = stmt
                .query_map(params![user_id.0], row_to_alias)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(aliases)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chime_core::types::NewLoopingReminder;

    use super::*;
    use crate::queries::loops;
    use crate::queries::test_support::setup;

    async fn make_loop(db: &Database, user_id: UserId) -> LoopId {
        loops::create_loop(
            db,
            NewLoopingReminder {
                user_id,
                interval_minutes: 10,
                message: "stretch".into(),
                stop_phrase: "stretched".into(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn lookup_ignores_case_and_padding() {
        let (db, user) = setup().await;
        let loop_id = make_loop(&db, user).await;
        let alias = create_alias(&db, user, loop_id, "Dishes Time").await.unwrap();

        let found = find_alias(&db, user, "  dishes time ").await.unwrap().unwrap();
        assert_eq!(found.id, alias.id);
        assert_eq!(found.phrase, "Dishes Time");
        assert!(find_alias(&db, user, "dishes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_phrase_is_an_invariant_violation() {
        let (db, user) = setup().await;
        let loop_id = make_loop(&db, user).await;
        create_alias(&db, user, loop_id, "go").await.unwrap();
        let err = create_alias(&db, user, loop_id, "GO").await.unwrap_err();
        assert!(matches!(err, ChimeError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn deleting_the_loop_removes_its_aliases() {
        let (db, user) = setup().await;
        let loop_id = make_loop(&db, user).await;
        create_alias(&db, user, loop_id, "go").await.unwrap();
        create_alias(&db, user, loop_id, "start it").await.unwrap();
        assert_eq!(list_aliases(&db, user).await.unwrap().len(), 2);

        loops::delete_loop(&db, user, loop_id).await.unwrap();
        assert!(list_aliases(&db, user).await.unwrap().is_empty());
    }
}
