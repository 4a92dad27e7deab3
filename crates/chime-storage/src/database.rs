// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use chime_core::ChimeError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the single SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file, applies PRAGMAs and runs
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, ChimeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ChimeError::Storage {
                source: Box::new(e),
            })?;
        }
        let conn = Connection::open(path).await.map_err(storage_err)?;
        let db = Self::prepare(conn, true).await?;
        debug!(path, "database opened");
        Ok(db)
    }

    /// An in-memory database with the full schema. Used by tests and
    /// dry runs.
    pub async fn open_in_memory() -> Result<Self, ChimeError> {
        let conn = Connection::open_in_memory().await.map_err(storage_err)?;
        Self::prepare(conn, false).await
    }

    async fn prepare(conn: Connection, wal: bool) -> Result<Self, ChimeError> {
        conn.call(move |conn| -> Result<(), ChimeError> {
            if wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })
                .map_err(storage_err)?;
                conn.pragma_update(None, "synchronous", "NORMAL")
                    .map_err(storage_err)?;
            }
            conn.pragma_update(None, "foreign_keys", true)
                .map_err(storage_err)?;
            conn.busy_timeout(BUSY_TIMEOUT).map_err(storage_err)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => ChimeError::Storage {
                source: other.to_string().into(),
            },
        })?;
        Ok(Self { conn })
    }

    /// The underlying connection. Query modules go through `call()`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), ChimeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into ChimeError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ChimeError {
    ChimeError::Storage {
        source: Box::new(e),
    }
}

/// Like [`map_tr_err`], but reports UNIQUE/CHECK constraint failures as
/// invariant violations naming `what` was being written.
pub(crate) fn map_constraint_err(
    e: tokio_rusqlite::Error<rusqlite::Error>,
    what: &str,
) -> ChimeError {
    let constraint = matches!(
        &e,
        tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
    );
    if constraint {
        ChimeError::InvariantViolation(format!("{what}: {e}"))
    } else {
        map_tr_err(e)
    }
}

pub(crate) fn storage_err(e: rusqlite::Error) -> ChimeError {
    ChimeError::Storage {
        source: Box::new(e),
    }
}
