// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool invocation log operations.

use calldock_core::CalldockError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ToolCallLog;

/// Insert one tool invocation log row.
///
/// `INSERT OR REPLACE` keyed on tool_call_id: the voice platform may
/// redeliver an event, and the latest resolution wins.
pub async fn log_tool_call(db: &Database, log: &ToolCallLog) -> Result<(), CalldockError> {
    let log = log.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR REPLACE INTO tool_calls
                    (tool_call_id, call_id, function, arguments_json, result_json,
                     error, duration_ms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    log.tool_call_id,
                    log.call_id,
                    log.function,
                    log.arguments_json,
                    log.result_json,
                    log.error,
                    log.duration_ms,
                    log.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List tool invocations logged for one call, oldest first.
pub async fn list_for_call(db: &Database, call_id: &str) -> Result<Vec<ToolCallLog>, CalldockError> {
    let call_id = call_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ToolCallLog>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT tool_call_id, call_id, function, arguments_json, result_json,
                        error, duration_ms, created_at
                 FROM tool_calls WHERE call_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![call_id], |row| {
                Ok(ToolCallLog {
                    tool_call_id: row.get(0)?,
                    call_id: row.get(1)?,
                    function: row.get(2)?,
                    arguments_json: row.get(3)?,
                    result_json: row.get(4)?,
                    error: row.get(5)?,
                    duration_ms: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
