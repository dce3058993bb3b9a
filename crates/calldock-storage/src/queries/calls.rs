// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call record CRUD operations.

use calldock_core::CalldockError;
use rusqlite::params;

use crate::database::Database;
use crate::models::CallRecord;

/// Insert or update a call record by id.
///
/// The upsert keeps the original created_at; everything else follows the
/// incoming record, so a call-started row can later be completed by the
/// call-ended pipeline.
pub async fn upsert_call(db: &Database, record: &CallRecord) -> Result<(), CalldockError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO calls (id, status, started_at, ended_at, duration_secs,
                                    transcript, summary, intake_json, classification_json,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    started_at = COALESCE(excluded.started_at, calls.started_at),
                    ended_at = COALESCE(excluded.ended_at, calls.ended_at),
                    duration_secs = COALESCE(excluded.duration_secs, calls.duration_secs),
                    transcript = COALESCE(excluded.transcript, calls.transcript),
                    summary = COALESCE(excluded.summary, calls.summary),
                    intake_json = COALESCE(excluded.intake_json, calls.intake_json),
                    classification_json = COALESCE(excluded.classification_json, calls.classification_json),
                    updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.status,
                    record.started_at,
                    record.ended_at,
                    record.duration_secs,
                    record.transcript,
                    record.summary,
                    record.intake_json,
                    record.classification_json,
                    record.created_at,
                    record.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a call record by id.
pub async fn get_call(db: &Database, id: &str) -> Result<Option<CallRecord>, CalldockError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<CallRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, status, started_at, ended_at, duration_secs, transcript,
                        summary, intake_json, classification_json, created_at, updated_at
                 FROM calls WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], |row| {
                Ok(CallRecord {
                    id: row.get(0)?,
                    status: row.get(1)?,
                    started_at: row.get(2)?,
                    ended_at: row.get(3)?,
                    duration_secs: row.get(4)?,
                    transcript: row.get(5)?,
                    summary: row.get(6)?,
                    intake_json: row.get(7)?,
                    classification_json: row.get(8)?,
                    created_at: row.get(9)?,
                    updated_at: row.get(10)?,
                })
            });
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
