// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chime reminder engine.
//!
//! This crate provides the domain types, the `Command` sum type, error types
//! and the collaborator traits (store, task scheduler, speech, sunset,
//! notification sink, clock) shared across the workspace.

pub mod command;
pub mod error;
pub mod notification;
pub mod task;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use command::{Command, Intent, PendingCompletion, ReminderSpec, UnknownReason};
pub use error::ChimeError;
pub use notification::{ItemRef, ListItem, ListTarget, Notification, Position};
pub use task::{ClaimedTask, RetryOutcome, ScheduledTask};
pub use types::UserId;

pub use traits::{
    Clock, NotificationSink, ReminderStore, SpeechAdapter, SunsetAdapter, SystemClock, TaskQueue,
    TaskScheduler,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_exported() {
        fn _assert_store<T: ReminderStore>() {}
        fn _assert_queue<T: TaskQueue>() {}
        fn _assert_speech<T: SpeechAdapter>() {}
        fn _assert_sunset<T: SunsetAdapter>() {}
        fn _assert_sink<T: NotificationSink>() {}
        fn _assert_clock<T: Clock>() {}
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
