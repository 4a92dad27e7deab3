// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sinks for the command line.

use std::io::Write;
use std::sync::Mutex;

use chime_core::{Notification, NotificationSink};
use tracing::{debug, warn};

/// Writes every notification as one JSON object per line.
///
/// The worker uses this on stdout so a front end can follow list changes
/// and voice alerts by reading the process output.
pub struct JsonLinesSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl NotificationSink for JsonLinesSink {
    fn notify(&self, notification: Notification) {
        let line = match serde_json::to_string(&notification) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize notification");
                return;
            }
        };
        let Ok(mut out) = self.out.lock() else {
            warn!("notification output poisoned, dropping notification");
            return;
        };
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write notification");
        }
    }
}

/// Logs notifications at debug level. Used by one-shot commands, whose
/// output is the reply itself.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::VoiceAlert { user_id, text, .. } => {
                debug!(user_id = %user_id, text = %text, "voice alert");
            }
            other => debug!(notification = ?other, "list change"),
        }
    }
}
