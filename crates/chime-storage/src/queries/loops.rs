// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Looping reminder operations.
//!
//! Numbers are assigned inside an IMMEDIATE insert transaction. Since every write
//! goes through the single connection thread, two creations for the same
//! user can never observe the same `MAX(number)`.

use chime_core::ChimeError;
use chime_core::types::{LoopId, LoopingReminder, NewLoopingReminder, UserId};
use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_constraint_err, map_tr_err};
use crate::time;

const COLUMNS: &str =
    "id, user_id, number, interval_minutes, message, stop_phrase, active, generation, created_at";

fn row_to_loop(row: &rusqlite::Row<'_>) -> rusqlite::Result<LoopingReminder> {
    Ok(LoopingReminder {
        id: LoopId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        number: row.get(2)?,
        interval_minutes: row.get(3)?,
        message: row.get(4)?,
        stop_phrase: row.get(5)?,
        active: row.get(6)?,
        generation: row.get(7)?,
        created_at: time::column(row, 8)?,
    })
}

fn select_scoped(
    conn: &rusqlite::Connection,
    user_id: UserId,
    id: LoopId,
) -> rusqlite::Result<Option<LoopingReminder>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM looping_reminders WHERE id = ?1 AND user_id = ?2"),
        params![id.0, user_id.0],
        row_to_loop,
    )
    .optional()
}

/// Inserts an active loop at generation 0 with the next free number.
pub async fn create_loop(
    db: &Database,
    new: NewLoopingReminder,
) -> Result<LoopingReminder, ChimeError> {
    let created_at = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<LoopingReminder> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let number: i64 = tx.query_row(
                "SELECT COALESCE(MAX(number), 0) + 1 FROM looping_reminders WHERE user_id = ?1",
                params![new.user_id.0],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO looping_reminders
                     (user_id, number, interval_minutes, message, stop_phrase,
                      active, generation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, ?6)",
                params![
                    new.user_id.0,
                    number,
                    new.interval_minutes,
                    new.message,
                    new.stop_phrase,
                    created_at
                ],
            )?;
            let id = LoopId(tx.last_insert_rowid());
            let created =
                select_scoped(&tx, new.user_id, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(|e| map_constraint_err(e, "looping reminder"))
}

pub async fn find_loop(
    db: &Database,
    user_id: UserId,
    id: LoopId,
) -> Result<Option<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| select_scoped(conn, user_id, id))
        .await
        .map_err(map_tr_err)
}

/// Unscoped lookup for the background lifecycle.
pub async fn find_loop_by_id(
    db: &Database,
    id: LoopId,
) -> Result<Option<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM looping_reminders WHERE id = ?1"),
                params![id.0],
                row_to_loop,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_loop_by_number(
    db: &Database,
    user_id: UserId,
    number: i64,
) -> Result<Option<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM looping_reminders WHERE user_id = ?1 AND number = ?2"
                ),
                params![user_id.0, number],
                row_to_loop,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All of the user's loops, by number.
pub async fn list_loops(db: &Database, user_id: UserId) -> Result<Vec<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<LoopingReminder>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM looping_reminders WHERE user_id = ?1 ORDER BY number ASC"
            ))?;
            let loops = stmt
                .query_map(params![user_id.0], row_to_loop)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(loops)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn next_loop_number(db: &Database, user_id: UserId) -> Result<i64, ChimeError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(MAX(number), 0) + 1 FROM looping_reminders WHERE user_id = ?1",
                params![user_id.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_active(
    db: &Database,
    user_id: UserId,
    id: LoopId,
    active: bool,
) -> Result<Option<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<LoopingReminder>> {
            let changed = conn.execute(
                "UPDATE looping_reminders SET active = ?1 WHERE id = ?2 AND user_id = ?3",
                params![active, id.0, user_id.0],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_scoped(conn, user_id, id)
        })
        .await
        .map_err(map_tr_err)
}

/// Increments the generation, invalidating every queued refire.
pub async fn bump_generation(
    db: &Database,
    user_id: UserId,
    id: LoopId,
) -> Result<Option<LoopingReminder>, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<LoopingReminder>> {
            let changed = conn.execute(
                "UPDATE looping_reminders SET generation = generation + 1
                 WHERE id = ?1 AND user_id = ?2",
                params![id.0, user_id.0],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_scoped(conn, user_id, id)
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the loop; its aliases go with it through the foreign key.
pub async fn delete_loop(db: &Database, user_id: UserId, id: LoopId) -> Result<bool, ChimeError> {
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "DELETE FROM looping_reminders WHERE id = ?1 AND user_id = ?2",
                params![id.0, user_id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{new_user, setup};
    use crate::queries::users;

    fn new_loop(user_id: UserId, stop_phrase: &str) -> NewLoopingReminder {
        NewLoopingReminder {
            user_id,
            interval_minutes: 5,
            message: "have you done the dishes?".into(),
            stop_phrase: stop_phrase.into(),
        }
    }

    #[tokio::test]
    async fn numbers_start_at_one_per_user() {
        let (db, user) = setup().await;
        let other = users::create_user(&db, new_user("Other")).await.unwrap();

        assert_eq!(next_loop_number(&db, user).await.unwrap(), 1);
        let first = create_loop(&db, new_loop(user, "done")).await.unwrap();
        let second = create_loop(&db, new_loop(user, "finished")).await.unwrap();
        let theirs = create_loop(&db, new_loop(other.id, "done")).await.unwrap();

        assert_eq!((first.number, second.number, theirs.number), (1, 2, 1));
        assert!(first.active);
        assert_eq!(first.generation, 0);
        assert_eq!(next_loop_number(&db, user).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn concurrent_creations_get_distinct_numbers() {
        let (db, user) = setup().await;
        let db = std::sync::Arc::new(db);

        let mut handles = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                create_loop(&db, new_loop(user, &format!("phrase {i}")))
                    .await
                    .unwrap()
                    .number
            }));
        }
        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=8).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn duplicate_stop_phrase_is_rejected_case_insensitively() {
        let (db, user) = setup().await;
        create_loop(&db, new_loop(user, "Doing the dishes")).await.unwrap();
        let err = create_loop(&db, new_loop(user, "doing THE dishes"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChimeError::InvariantViolation(_)), "{err}");
    }

    #[tokio::test]
    async fn activation_and_generation() {
        let (db, user) = setup().await;
        let created = create_loop(&db, new_loop(user, "done")).await.unwrap();

        let stopped = set_active(&db, user, created.id, false).await.unwrap().unwrap();
        assert!(!stopped.active);

        let bumped = bump_generation(&db, user, created.id).await.unwrap().unwrap();
        assert_eq!(bumped.generation, 1);

        let other = users::create_user(&db, new_user("Other")).await.unwrap();
        assert!(set_active(&db, other.id, created.id, true).await.unwrap().is_none());
        assert!(find_loop(&db, other.id, created.id).await.unwrap().is_none());
        assert!(find_loop_by_id(&db, created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (db, user) = setup().await;
        let a = create_loop(&db, new_loop(user, "a")).await.unwrap();
        let b = create_loop(&db, new_loop(user, "b")).await.unwrap();
        assert!(delete_loop(&db, user, a.id).await.unwrap());
        assert!(!delete_loop(&db, user, a.id).await.unwrap());

        let remaining = list_loops(&db, user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
        assert_eq!(
            find_loop_by_number(&db, user, 2).await.unwrap().map(|l| l.id),
            Some(b.id)
        );
        // Numbers are never reused while higher ones exist.
        assert_eq!(next_loop_number(&db, user).await.unwrap(), 3);
    }
}
