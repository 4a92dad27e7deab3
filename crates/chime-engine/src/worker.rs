// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background runner for the durable task queue.

use std::sync::Arc;
use std::time::Duration;

use chime_config::model::WorkerConfig;
use chime_core::{ChimeError, RetryOutcome, TaskQueue};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;

/// Claims due tasks, runs them through the engine and acknowledges or
/// retries each one.
pub struct Worker {
    engine: Arc<Engine>,
    queue: Arc<dyn TaskQueue>,
    poll_interval: Duration,
    batch_size: usize,
    retention: chrono::Duration,
}

/// How often finished queue rows are pruned while running.
const PRUNE_EVERY: Duration = Duration::from_secs(60 * 60);

/// Longest retention honored; larger configured values are clamped.
const MAX_RETENTION_HOURS: u64 = 10 * 365 * 24;

/// Counts from one [`Worker::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub claimed: usize,
    pub completed: usize,
    pub retried: usize,
    pub dropped: usize,
}

impl Worker {
    pub fn new(engine: Arc<Engine>, queue: Arc<dyn TaskQueue>, config: &WorkerConfig) -> Self {
        Self {
            engine,
            queue,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            batch_size: config.batch_size.max(1),
            retention: chrono::Duration::hours(
                i64::try_from(config.task_retention_hours.min(MAX_RETENTION_HOURS)).unwrap_or(0),
            ),
        }
    }

    /// Runs every task due now, once.
    pub async fn tick(&self) -> Result<TickReport, ChimeError> {
        let claimed = self
            .queue
            .claim_due(self.engine.now(), self.batch_size)
            .await?;
        let mut report = TickReport {
            claimed: claimed.len(),
            ..TickReport::default()
        };

        for task in claimed {
            match self.engine.run_task(&task.task).await {
                Ok(()) => {
                    self.queue.complete(task.id, self.engine.now()).await?;
                    report.completed += 1;
                }
                Err(e) => match self.queue.retry_or_drop(task.id, self.engine.now()).await? {
                    RetryOutcome::Retrying { run_at } => {
                        warn!(
                            task_id = task.id,
                            queue = task.task.queue_name(),
                            attempt = task.attempts + 1,
                            retry_at = %run_at,
                            error = %e,
                            "task failed, will retry"
                        );
                        report.retried += 1;
                    }
                    RetryOutcome::Dropped => {
                        error!(
                            task_id = task.id,
                            queue = task.task.queue_name(),
                            attempts = task.max_attempts,
                            error = %e,
                            "task failed permanently, dropped"
                        );
                        report.dropped += 1;
                    }
                },
            }
        }
        Ok(report)
    }

    /// Deletes finished queue rows older than the retention window.
    pub async fn prune(&self) -> Result<usize, ChimeError> {
        let before = self.engine.now() - self.retention;
        let pruned = self.queue.prune_finished(before).await?;
        if pruned > 0 {
            info!(pruned, before = %before, "finished tasks pruned");
        }
        Ok(pruned)
    }

    /// Polls until `cancel` fires. Tick errors are logged and the loop
    /// carries on.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "worker started"
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately, so startup prunes too.
        let mut prune_interval = tokio::time::interval(PRUNE_EVERY);
        prune_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) if report.claimed > 0 => {
                            debug!(
                                claimed = report.claimed,
                                completed = report.completed,
                                retried = report.retried,
                                dropped = report.dropped,
                                "worker tick"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "worker tick failed");
                        }
                    }
                    let purged = self.engine.purge_audio();
                    if purged > 0 {
                        debug!(purged, "expired alert audio purged");
                    }
                }
                _ = prune_interval.tick() => {
                    if let Err(e) = self.prune().await {
                        warn!(error = %e, "pruning finished tasks failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("worker shutting down");
                    break;
                }
            }
        }
    }
}
