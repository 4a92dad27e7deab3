// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Due-task execution: deliveries, daily chaining and loop re-fires.

use chime_core::types::EntryKind;
use chime_core::{ItemRef, ListTarget, Notification, ReminderStore, ScheduledTask};
use chime_test_utils::TestHarness;
use chrono::Duration;
use tokio_util::sync::CancellationToken;

const CREATE_DISHES_LOOP: &str = "set a looping reminder for 5 minutes saying \
     'have you done the dishes?' until I say 'dishes done'";

fn loop_refires(tasks: &[(chrono::DateTime<chrono::Utc>, ScheduledTask)]) -> usize {
    tasks
        .iter()
        .filter(|(_, t)| matches!(t, ScheduledTask::LoopRefire { .. }))
        .count()
}

#[tokio::test]
async fn timer_is_delivered_once_due() {
    let h = TestHarness::new().await.unwrap();
    h.say("set a timer for 5 minutes").await.unwrap();
    let timer = h
        .engine
        .pending_entries(h.user.id, EntryKind::Timer)
        .await
        .unwrap()
        .remove(0);
    h.sink.take();

    let early = h.advance_and_run(Duration::minutes(4)).await.unwrap();
    assert_eq!(early.claimed, 0);

    let report = h.advance_and_run(Duration::minutes(1)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(h.sink.voice_alerts(), vec!["Timer finished after 5 minutes"]);

    let events = h.sink.events();
    assert!(events.iter().any(|n| matches!(
        n,
        Notification::Removed { item: ItemRef::Entry(id), .. } if *id == timer.id
    )));
    assert!(
        h.engine
            .pending_entries(h.user.id, EntryKind::Timer)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn alert_audio_is_cached_under_its_token() {
    let h = TestHarness::new().await.unwrap();
    h.say("set a timer for 1 minute").await.unwrap();
    h.advance_and_run(Duration::minutes(1)).await.unwrap();

    let token = h
        .sink
        .events()
        .into_iter()
        .find_map(|n| match n {
            Notification::VoiceAlert { token, .. } => Some(token),
            _ => None,
        })
        .unwrap();
    let audio = h.engine.cached_audio(&token).unwrap();
    assert_eq!(audio.as_slice(), b"Timer finished after 1 minute");
}

#[tokio::test]
async fn daily_reminder_chains_to_the_next_day() {
    let h = TestHarness::new().await.unwrap();
    h.say("daily reminder at 9 pm to stretch").await.unwrap();
    let first = h
        .engine
        .pending_entries(h.user.id, EntryKind::Daily)
        .await
        .unwrap()
        .remove(0);
    h.sink.take();

    let report = h
        .advance_and_run(Duration::hours(6) + Duration::minutes(49))
        .await
        .unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(h.sink.voice_alerts(), vec!["It's 9 PM. Reminder: stretch"]);

    let daily = h
        .engine
        .pending_entries(h.user.id, EntryKind::Daily)
        .await
        .unwrap();
    assert_eq!(daily.len(), 1);
    let next = &daily[0];
    assert_eq!(next.previous_id, Some(first.id));
    assert_eq!(next.fire_at, first.fire_at + Duration::days(1));
    assert_eq!(next.message, "stretch");

    let tasks = h.storage.pending_tasks().await.unwrap();
    assert!(tasks.iter().any(|(at, t)| {
        *at == next.fire_at && *t == ScheduledTask::DeliverReminder { entry_id: next.id }
    }));

    let events = h.sink.events();
    assert!(events.iter().any(|n| matches!(
        n,
        Notification::Inserted { target: ListTarget::DailyReminders, .. }
    )));
    assert!(events.iter().any(|n| matches!(
        n,
        Notification::Removed { item: ItemRef::Entry(id), .. } if *id == first.id
    )));
}

#[tokio::test]
async fn cancelled_reminder_is_not_delivered() {
    let h = TestHarness::new().await.unwrap();
    h.say("reminder at 4 pm to call mom").await.unwrap();
    let entry = h
        .engine
        .pending_entries(h.user.id, EntryKind::OneShot)
        .await
        .unwrap()
        .remove(0);
    assert!(h.engine.cancel_entry(h.user.id, entry.id).await.unwrap());

    let report = h.advance_and_run(Duration::hours(2)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert!(h.sink.voice_alerts().is_empty());
}

#[tokio::test]
async fn loop_refires_until_stopped() {
    let h = TestHarness::new().await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();

    h.advance_and_run(Duration::minutes(5)).await.unwrap();
    h.advance_and_run(Duration::minutes(5)).await.unwrap();
    assert_eq!(
        h.sink.voice_alerts(),
        vec!["have you done the dishes?", "have you done the dishes?"]
    );

    let reply = h.say("okay, dishes done").await.unwrap();
    assert_eq!(reply.text, "Stopped looping reminder 1");

    let report = h.advance_and_run(Duration::minutes(5)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(h.sink.voice_alerts().len(), 2);
    assert_eq!(loop_refires(&h.storage.pending_tasks().await.unwrap()), 0);
}

#[tokio::test]
async fn missed_refires_are_skipped_not_replayed() {
    let h = TestHarness::new().await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();
    let created = h.now();

    // Worker was down for 17 minutes.
    h.advance_and_run(Duration::minutes(17)).await.unwrap();
    assert_eq!(h.sink.voice_alerts().len(), 1);

    let tasks = h.storage.pending_tasks().await.unwrap();
    assert_eq!(loop_refires(&tasks), 1);
    assert_eq!(tasks[0].0, created + Duration::minutes(20));
}

#[tokio::test]
async fn stale_generation_refire_is_ignored() {
    let h = TestHarness::new().await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();

    h.advance(Duration::minutes(1));
    h.say("dishes done").await.unwrap();
    h.advance(Duration::minutes(1));
    let reply = h.say("run loop 1").await.unwrap();
    assert_eq!(reply.text, "Running looping reminder 1");

    // The generation-0 re-fire queued at creation comes due at minute 5.
    let report = h.advance_and_run(Duration::minutes(3)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert!(h.sink.voice_alerts().is_empty());

    h.advance_and_run(Duration::minutes(2)).await.unwrap();
    assert_eq!(h.sink.voice_alerts(), vec!["have you done the dishes?"]);
}

#[tokio::test]
async fn failed_refire_is_retried_without_duplicating_the_next_one() {
    let h = TestHarness::new().await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();
    let created = h.now();

    h.speech.fail_next(1);
    let report = h.advance_and_run(Duration::minutes(5)).await.unwrap();
    assert_eq!(report.retried, 1);
    assert!(h.sink.voice_alerts().is_empty());

    // The retry sits three seconds out; the next occurrence is already queued.
    let tasks = h.storage.pending_tasks().await.unwrap();
    assert_eq!(loop_refires(&tasks), 2);

    let report = h.advance_and_run(Duration::seconds(3)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(h.sink.voice_alerts(), vec!["have you done the dishes?"]);

    let tasks = h.storage.pending_tasks().await.unwrap();
    assert_eq!(loop_refires(&tasks), 1);
    assert_eq!(tasks[0].0, created + Duration::minutes(10));
}

#[tokio::test]
async fn exhausted_task_is_dropped() {
    let h = TestHarness::builder()
        .with_max_attempts(1)
        .build()
        .await
        .unwrap();
    h.say("set a timer for 5 minutes").await.unwrap();
    let timer = h
        .engine
        .pending_entries(h.user.id, EntryKind::Timer)
        .await
        .unwrap()
        .remove(0);

    h.speech.fail_next(1);
    let report = h.advance_and_run(Duration::minutes(5)).await.unwrap();
    assert_eq!(report.dropped, 1);
    assert!(h.storage.pending_tasks().await.unwrap().is_empty());

    // Never delivered: still pending, though past its fire time.
    let stored = h
        .storage
        .find_schedule_entry(timer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_pending());
    assert!(h.sink.voice_alerts().is_empty());
}

#[tokio::test]
async fn loop_stopped_during_synthesis_does_not_alert() {
    let h = TestHarness::new().await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();
    h.advance(Duration::minutes(5));

    let gate = h.speech.hold_next();
    let (report, reply) = tokio::join!(h.run_due(), async {
        gate.entered().await;
        let reply = h.say("dishes done").await.unwrap();
        gate.release();
        reply
    });

    assert_eq!(reply.text, "Stopped looping reminder 1");
    assert_eq!(report.unwrap().completed, 1);
    assert!(h.sink.voice_alerts().is_empty());
}

#[tokio::test]
async fn daily_reminder_cancelled_during_delivery_is_not_chained() {
    let h = TestHarness::new().await.unwrap();
    h.say("daily reminder at 9 pm to stretch").await.unwrap();
    let entry = h
        .engine
        .pending_entries(h.user.id, EntryKind::Daily)
        .await
        .unwrap()
        .remove(0);
    h.advance(Duration::hours(6) + Duration::minutes(49));

    let gate = h.speech.hold_next();
    let (report, cancelled) = tokio::join!(h.run_due(), async {
        gate.entered().await;
        let cancelled = h.engine.cancel_entry(h.user.id, entry.id).await.unwrap();
        gate.release();
        cancelled
    });

    assert!(cancelled);
    assert_eq!(report.unwrap().completed, 1);
    assert!(h.sink.voice_alerts().is_empty());
    assert!(
        h.engine
            .pending_entries(h.user.id, EntryKind::Daily)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(h.storage.pending_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn finished_tasks_are_pruned_after_retention() {
    let h = TestHarness::new().await.unwrap();
    h.say("set a timer for 1 minute").await.unwrap();
    h.say(CREATE_DISHES_LOOP).await.unwrap();
    h.advance_and_run(Duration::minutes(1)).await.unwrap();
    assert_eq!(h.worker.prune().await.unwrap(), 0);

    h.advance(Duration::days(8));
    assert_eq!(h.worker.prune().await.unwrap(), 1);

    // The loop's queued re-fire is pending and survives.
    let tasks = h.storage.pending_tasks().await.unwrap();
    assert_eq!(loop_refires(&tasks), 1);
}

#[tokio::test]
async fn worker_runs_until_cancelled() {
    let h = TestHarness::new().await.unwrap();
    h.say("set a timer for 1 minute").await.unwrap();
    h.advance(Duration::minutes(1));

    let cancel = CancellationToken::new();
    let stopper = async {
        while h.sink.voice_alerts().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        cancel.cancel();
    };
    tokio::time::timeout(std::time::Duration::from_secs(10), async {
        tokio::join!(h.worker.run(cancel.clone()), stopper)
    })
    .await
    .unwrap();

    assert_eq!(h.sink.voice_alerts(), vec!["Timer finished after 1 minute"]);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn failed_task_is_logged_with_its_queue() {
    let h = TestHarness::new().await.unwrap();
    h.say("set a timer for 1 minute").await.unwrap();

    h.speech.fail_next(1);
    h.advance_and_run(Duration::minutes(1)).await.unwrap();
    assert!(logs_contain("task failed, will retry"));
    assert!(logs_contain("queue=\"reminders\""));
}
