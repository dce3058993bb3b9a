// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification outcome log operations.

use calldock_core::CalldockError;
use rusqlite::params;

use crate::database::Database;
use crate::models::NotificationOutcome;

/// Record the terminal outcome of one recipient's notification.
pub async fn record_notification(
    db: &Database,
    outcome: &NotificationOutcome,
) -> Result<(), CalldockError> {
    let outcome = outcome.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO notifications
                    (correlation_id, recipient, status, attempts, provider_id,
                     last_error, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    outcome.correlation_id,
                    outcome.recipient,
                    outcome.status,
                    outcome.attempts,
                    outcome.provider_id,
                    outcome.last_error,
                    outcome.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List outcomes recorded for one correlation id (callId or toolCallId).
pub async fn list_for_correlation(
    db: &Database,
    correlation_id: &str,
) -> Result<Vec<NotificationOutcome>, CalldockError> {
    let correlation_id = correlation_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<NotificationOutcome>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT correlation_id, recipient, status, attempts, provider_id,
                        last_error, created_at
                 FROM notifications WHERE correlation_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![correlation_id], |row| {
                Ok(NotificationOutcome {
                    correlation_id: row.get(0)?,
                    recipient: row.get(1)?,
                    status: row.get(2)?,
                    attempts: row.get(3)?,
                    provider_id: row.get(4)?,
                    last_error: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?;
            let mut outcomes = Vec::new();
            for row in rows {
                outcomes.push(row?);
            }
            Ok(outcomes)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_outcome(recipient: &str, status: &str, attempts: i64) -> NotificationOutcome {
        NotificationOutcome {
            correlation_id: "call-1".to_string(),
            recipient: recipient.to_string(),
            status: status.to_string(),
            attempts,
            provider_id: (status == "delivered").then(|| "SM123".to_string()),
            last_error: (status == "exhausted").then(|| "timeout".to_string()),
            created_at: "2026-02-01T09:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn record_and_list_round_trips() {
        let (db, _dir) = setup_db().await;
        record_notification(&db, &make_outcome("+33611111111", "delivered", 1))
            .await
            .unwrap();
        record_notification(&db, &make_outcome("+33622222222", "exhausted", 3))
            .await
            .unwrap();

        let outcomes = list_for_correlation(&db, "call-1").await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, "delivered");
        assert_eq!(outcomes[1].attempts, 3);
        assert_eq!(outcomes[1].last_error.as_deref(), Some("timeout"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_correlation_returns_empty() {
        let (db, _dir) = setup_db().await;
        let outcomes = list_for_correlation(&db, "nothing").await.unwrap();
        assert!(outcomes.is_empty());
        db.close().await.unwrap();
    }
}
