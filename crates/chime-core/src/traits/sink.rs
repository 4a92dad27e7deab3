// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-way live-view notification sink.

use crate::notification::Notification;

/// Receives ordered-insertion and lifecycle events for the live view.
///
/// Delivery is fire-and-forget: a sink with no listeners drops events.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}
