// SPDX-FileCopyrightText: 2026 Conteur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use tracing::debug;

use conteur_core::ConteurError;

use crate::migrations;

/// Handle to the SQLite database.
///
/// Cloning is cheap: all clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// any pending migrations.
    pub async fn open(path: &str) -> Result<Self, ConteurError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        conn.call(|conn| -> Result<(), ConteurError> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
            .map_err(|e| ConteurError::Store {
                source: Box::new(e),
            })?;
            migrations::run_migrations(conn).map_err(|e| ConteurError::Store {
                source: Box::new(e),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            e => ConteurError::Store {
                source: Box::new(e),
            },
        })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Access the underlying tokio-rusqlite connection for `.call()` queries.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and flush pending writes. Call before shutdown.
    pub async fn close(&self) -> Result<(), ConteurError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the domain storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> ConteurError {
    ConteurError::Store {
        source: Box::new(e),
    }
}
