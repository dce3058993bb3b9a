// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use calldock_core::CalldockError;

use crate::migrations;

/// Handle to the single SQLite connection.
///
/// Wraps one `tokio_rusqlite::Connection`; all query modules go through
/// [`Database::connection`] and `conn.call()`, which serializes closures
/// on one background thread and eliminates SQLITE_BUSY under concurrency.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, run pending migrations,
    /// and apply PRAGMAs.
    ///
    /// Migrations run on a blocking connection before the async handle is
    /// opened, so a half-migrated schema is never visible to queries.
    pub async fn open(path: &str) -> Result<Self, CalldockError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CalldockError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CalldockError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| CalldockError::Storage {
                    source: Box::new(e),
                })?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CalldockError::Internal(format!("migration task failed: {e}")))??;

        let conn = Connection::open(path)
            .await
            .map_err(|e| CalldockError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened, migrations applied");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), CalldockError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> CalldockError {
    CalldockError::Storage {
        source: Box::new(err),
    }
}
