// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Chime.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed operations for users,
//! schedule entries, looping reminders, aliases, pending interactions and
//! the voice command audit log, and a durable delayed task queue.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;
mod time;

pub use adapter::SqliteStorage;
pub use database::Database;
