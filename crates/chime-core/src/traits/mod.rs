// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Async collaborators use `#[async_trait]` so they can sit behind `Arc<dyn _>`.

pub mod clock;
pub mod scheduler;
pub mod sink;
pub mod speech;
pub mod store;
pub mod sunset;

pub use clock::{Clock, SystemClock};
pub use scheduler::{TaskQueue, TaskScheduler};
pub use sink::NotificationSink;
pub use speech::SpeechAdapter;
pub use store::ReminderStore;
pub use sunset::SunsetAdapter;
