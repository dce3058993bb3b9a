// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use calldock_config::model::StorageConfig;
use calldock_core::types::{CallRecord, NotificationOutcome, ToolCallLog};
use calldock_core::{AdapterType, CalldockError, HealthStatus, PluginAdapter, RecordStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed record store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`RecordStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`RecordStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, CalldockError> {
        self.db.get().ok_or_else(|| CalldockError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Run one storage operation under the configured time bound.
    ///
    /// An elapsed deadline surfaces as a timeout failure, the same as any
    /// other stalled downstream call.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CalldockError>>,
    ) -> Result<T, CalldockError> {
        let limit = Duration::from_secs(self.config.query_timeout_secs);
        match tokio::time::timeout(limit, op).await {
            Ok(result) => result,
            Err(_) => Err(CalldockError::Timeout { duration: limit }),
        }
    }

    /// Lists persisted notification outcomes for one correlation id.
    pub async fn list_notifications(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<NotificationOutcome>, CalldockError> {
        let db = self.db()?;
        self.bounded(queries::notifications::list_for_correlation(db, correlation_id))
            .await
    }

    /// Lists tool invocation logs for one call, oldest first.
    pub async fn list_tool_calls(
        &self,
        call_id: &str,
    ) -> Result<Vec<ToolCallLog>, CalldockError> {
        let db = self.db()?;
        self.bounded(queries::tool_calls::list_for_call(db, call_id)).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CalldockError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CalldockError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn initialize(&self) -> Result<(), CalldockError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| CalldockError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CalldockError> {
        self.db()?.close().await
    }

    async fn upsert_call(&self, call: &CallRecord) -> Result<(), CalldockError> {
        let db = self.db()?;
        self.bounded(queries::calls::upsert_call(db, call)).await
    }

    async fn get_call(&self, call_id: &str) -> Result<Option<CallRecord>, CalldockError> {
        let db = self.db()?;
        self.bounded(queries::calls::get_call(db, call_id)).await
    }

    async fn log_tool_call(&self, log: &ToolCallLog) -> Result<(), CalldockError> {
        let db = self.db()?;
        self.bounded(queries::tool_calls::log_tool_call(db, log)).await
    }

    async fn record_notification(
        &self,
        outcome: &NotificationOutcome,
    ) -> Result<(), CalldockError> {
        let db = self.db()?;
        self.bounded(queries::notifications::record_notification(db, outcome))
            .await
    }
}
