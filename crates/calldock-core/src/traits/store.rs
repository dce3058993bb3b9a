// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for the persistence sink.

use async_trait::async_trait;

use crate::error::CalldockError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CallRecord, NotificationOutcome, ToolCallLog};

/// Adapter for the opaque persistence sink.
///
/// The core only performs data-level append/upsert operations keyed by
/// callId and toolCallId; schema management lives behind this trait.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), CalldockError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CalldockError>;

    /// Creates or updates the call record with the given id.
    ///
    /// The record is created on the first event referencing the id and
    /// updated in place by subsequent events for the same id.
    async fn upsert_call(&self, call: &CallRecord) -> Result<(), CalldockError>;

    /// Fetches a call record by id.
    async fn get_call(&self, call_id: &str) -> Result<Option<CallRecord>, CalldockError>;

    /// Appends one tool invocation log row.
    async fn log_tool_call(&self, log: &ToolCallLog) -> Result<(), CalldockError>;

    /// Appends one per-recipient notification outcome row.
    async fn record_notification(
        &self,
        outcome: &NotificationOutcome,
    ) -> Result<(), CalldockError>;
}
