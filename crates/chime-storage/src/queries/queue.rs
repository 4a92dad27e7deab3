// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable delayed task queue.
//!
//! Each row carries a dedupe key derived from the task, so enqueueing the
//! same occurrence twice leaves a single row. Claimed rows move to
//! `processing`; failures either return to `pending` with a backoff or end
//! in `failed` once attempts are exhausted.

use chime_core::task::retry_backoff;
use chime_core::{ChimeError, ClaimedTask, RetryOutcome, ScheduledTask};
use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::warn;

use crate::database::{Database, map_tr_err};
use crate::time;

/// Enqueue a task. Returns `false` if its dedupe key is already present.
pub async fn enqueue_at(
    db: &Database,
    run_at: DateTime<Utc>,
    task: &ScheduledTask,
    max_attempts: u32,
) -> Result<bool, ChimeError> {
    let queue_name = task.queue_name().to_string();
    let dedupe_key = task.dedupe_key();
    let payload = serde_json::to_string(task).map_err(|e| ChimeError::Storage {
        source: Box::new(e),
    })?;
    let run_at = time::to_sql(run_at);
    let now = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let inserted = conn.execute(
                "INSERT INTO task_queue
                     (queue_name, dedupe_key, payload, run_at, max_attempts, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(dedupe_key) DO NOTHING",
                params![queue_name, dedupe_key, payload, run_at, max_attempts, now],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Claims up to `limit` due tasks, oldest `run_at` first.
///
/// Rows whose payload no longer decodes are marked failed and skipped.
pub async fn claim_due(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ClaimedTask>, ChimeError> {
    let now_text = time::to_sql(now);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let (claimed, undecodable) = db
        .connection()
        .call(move |conn| -> rusqlite::Result<(Vec<ClaimedTask>, Vec<i64>)> {
            let tx = conn.transaction()?;
            let rows = {
                let mut stmt = tx.prepare(
                    "SELECT id, payload, run_at, attempts, max_attempts FROM task_queue
                     WHERE status = 'pending' AND run_at <= ?1
                     ORDER BY run_at ASC, id ASC
                     LIMIT ?2",
                )?;
                stmt.query_map(params![now_text, limit], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        time::column(row, 2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u32>(4)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?
            };

            let mut claimed = Vec::with_capacity(rows.len());
            let mut undecodable = Vec::new();
            for (id, payload, run_at, attempts, max_attempts) in rows {
                match serde_json::from_str::<ScheduledTask>(&payload) {
                    Ok(task) => {
                        tx.execute(
                            "UPDATE task_queue SET status = 'processing', updated_at = ?1
                             WHERE id = ?2",
                            params![now_text, id],
                        )?;
                        claimed.push(ClaimedTask {
                            id,
                            task,
                            run_at,
                            attempts,
                            max_attempts,
                        });
                    }
                    Err(_) => {
                        tx.execute(
                            "UPDATE task_queue SET status = 'failed', updated_at = ?1
                             WHERE id = ?2",
                            params![now_text, id],
                        )?;
                        undecodable.push(id);
                    }
                }
            }
            tx.commit()?;
            Ok((claimed, undecodable))
        })
        .await
        .map_err(map_tr_err)?;

    for id in undecodable {
        warn!(task_id = id, "dropping task with undecodable payload");
    }
    Ok(claimed)
}

/// Marks a claimed task as completed at `now`.
pub async fn complete(db: &Database, id: i64, now: DateTime<Utc>) -> Result<(), ChimeError> {
    let now = time::to_sql(now);
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "UPDATE task_queue SET status = 'completed', updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Records a failed attempt.
///
/// Increments attempts. If attempts >= max_attempts, sets status to "failed".
/// Otherwise returns the task to "pending" at `now` plus the backoff.
pub async fn retry_or_drop(
    db: &Database,
    id: i64,
    now: DateTime<Utc>,
) -> Result<RetryOutcome, ChimeError> {
    let now_text = time::to_sql(now);
    db.connection()
        .call(move |conn| -> rusqlite::Result<RetryOutcome> {
            let (attempts, max_attempts): (u32, u32) = conn.query_row(
                "SELECT attempts, max_attempts FROM task_queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            if new_attempts >= max_attempts {
                conn.execute(
                    "UPDATE task_queue SET status = 'failed', attempts = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![new_attempts, now_text, id],
                )?;
                return Ok(RetryOutcome::Dropped);
            }

            let backoff = chrono::Duration::from_std(retry_backoff(new_attempts))
                .unwrap_or_else(|_| chrono::Duration::days(1));
            let run_at = now + backoff;
            conn.execute(
                "UPDATE task_queue SET status = 'pending', attempts = ?1, run_at = ?2,
                 updated_at = ?3 WHERE id = ?4",
                params![new_attempts, time::to_sql(run_at), now_text, id],
            )?;
            Ok(RetryOutcome::Retrying { run_at })
        })
        .await
        .map_err(map_tr_err)
}

/// Returns interrupted `processing` rows to `pending`. Run once at worker
/// start, before the first claim.
pub async fn recover_interrupted(db: &Database) -> Result<usize, ChimeError> {
    let now = time::to_sql(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE task_queue SET status = 'pending', updated_at = ?1
                 WHERE status = 'processing'",
                params![now],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes completed and failed rows last touched before `before`.
///
/// Pending and processing rows are never removed.
pub async fn prune_finished(db: &Database, before: DateTime<Utc>) -> Result<usize, ChimeError> {
    let before = time::to_sql(before);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM task_queue
                 WHERE status IN ('completed', 'failed') AND updated_at < ?1",
                params![before],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Every pending task, soonest first.
pub async fn pending_tasks(db: &Database) -> Result<Vec<(DateTime<Utc>, ScheduledTask)>, ChimeError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<(DateTime<Utc>, String)>> {
            let mut stmt = conn.prepare(
                "SELECT run_at, payload FROM task_queue WHERE status = 'pending'
                 ORDER BY run_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((time::column(row, 0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?
        .into_iter()
        .map(|(run_at, payload)| {
            serde_json::from_str(&payload)
                .map(|task| (run_at, task))
                .map_err(|e| ChimeError::Storage {
                    source: Box::new(e),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chime_core::types::{EntryId, LoopId};
    use chrono::{Duration, TimeZone};

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn deliver(id: i64) -> ScheduledTask {
        ScheduledTask::DeliverReminder {
            entry_id: EntryId(id),
        }
    }

    async fn status_of(db: &Database, id: i64) -> (String, u32) {
        db.connection()
            .call(move |conn| -> rusqlite::Result<(String, u32)> {
                conn.query_row(
                    "SELECT status, attempts FROM task_queue WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn enqueue_is_deduplicated() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(enqueue_at(&db, noon(), &deliver(1), 5).await.unwrap());
        assert!(!enqueue_at(&db, noon(), &deliver(1), 5).await.unwrap());
        assert!(enqueue_at(&db, noon(), &deliver(2), 5).await.unwrap());
        assert_eq!(pending_tasks(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_due_tasks_are_claimed_in_order() {
        let db = Database::open_in_memory().await.unwrap();
        enqueue_at(&db, noon() + Duration::minutes(5), &deliver(1), 5)
            .await
            .unwrap();
        enqueue_at(&db, noon() - Duration::minutes(1), &deliver(2), 5)
            .await
            .unwrap();
        let refire = ScheduledTask::LoopRefire {
            loop_id: LoopId(7),
            scheduled_fire_at: noon(),
            generation: 3,
        };
        enqueue_at(&db, noon(), &refire, 5).await.unwrap();

        let claimed = claim_due(&db, noon(), 10).await.unwrap();
        let tasks: Vec<_> = claimed.iter().map(|c| c.task.clone()).collect();
        assert_eq!(tasks, vec![deliver(2), refire]);

        // Claimed rows are not handed out twice.
        assert!(claim_due(&db, noon(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_back_off_then_drop() {
        let db = Database::open_in_memory().await.unwrap();
        enqueue_at(&db, noon(), &deliver(1), 2).await.unwrap();

        let task = claim_due(&db, noon(), 1).await.unwrap().remove(0);
        let outcome = retry_or_drop(&db, task.id, noon()).await.unwrap();
        assert_eq!(
            outcome,
            RetryOutcome::Retrying {
                run_at: noon() + Duration::seconds(3)
            }
        );
        assert_eq!(status_of(&db, task.id).await, ("pending".to_string(), 1));
        assert!(claim_due(&db, noon(), 1).await.unwrap().is_empty());

        let retried = claim_due(&db, noon() + Duration::seconds(3), 1)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(retried.attempts, 1);
        let outcome = retry_or_drop(&db, retried.id, noon()).await.unwrap();
        assert_eq!(outcome, RetryOutcome::Dropped);
        assert_eq!(status_of(&db, task.id).await, ("failed".to_string(), 2));
    }

    #[tokio::test]
    async fn complete_and_recover() {
        let db = Database::open_in_memory().await.unwrap();
        enqueue_at(&db, noon(), &deliver(1), 5).await.unwrap();
        enqueue_at(&db, noon(), &deliver(2), 5).await.unwrap();
        let claimed = claim_due(&db, noon(), 10).await.unwrap();
        complete(&db, claimed[0].id, noon()).await.unwrap();

        assert_eq!(recover_interrupted(&db).await.unwrap(), 1);
        let again = claim_due(&db, noon(), 10).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].task, deliver(2));
        assert_eq!(status_of(&db, claimed[0].id).await.0, "completed");
    }

    #[tokio::test]
    async fn prune_removes_only_old_finished_rows() {
        let db = Database::open_in_memory().await.unwrap();
        for id in 1..=4 {
            enqueue_at(&db, noon(), &deliver(id), 1).await.unwrap();
        }
        let claimed = claim_due(&db, noon(), 3).await.unwrap();
        complete(&db, claimed[0].id, noon()).await.unwrap();
        retry_or_drop(&db, claimed[1].id, noon()).await.unwrap();
        complete(&db, claimed[2].id, noon() + Duration::days(2))
            .await
            .unwrap();

        let pruned = prune_finished(&db, noon() + Duration::days(1)).await.unwrap();
        assert_eq!(pruned, 2);

        // The recent completion and the untouched pending row stay.
        assert_eq!(status_of(&db, claimed[2].id).await.0, "completed");
        let pending = pending_tasks(&db).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1, deliver(4));
    }
}
