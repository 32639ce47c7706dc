// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case message operations.

use rusqlite::{OptionalExtension, params};
use viva_core::{CaseMessage, Sender, VivaError};

use super::{MESSAGE_COLUMNS, message_from_row, new_id};
use crate::database::{Database, NOW_SQL, map_tr_err};

/// Ordering used for every message read: conversation time, then turn position.
pub(crate) const MESSAGE_ORDER: &str = "ORDER BY timestamp ASC, turn_index ASC, rowid ASC";

/// Append a message to an existing case, stamped with the current time.
pub async fn append_message(
    db: &Database,
    case_id: &str,
    text: &str,
    sender: Sender,
) -> Result<CaseMessage, VivaError> {
    let case_id = case_id.to_string();
    let missing_id = case_id.clone();
    let text = text.to_string();
    let inserted = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let exists: Option<i64> = tx
                .query_row("SELECT 1 FROM cases WHERE id = ?1", params![case_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Ok(None);
            }
            let id = new_id();
            tx.execute(
                &format!(
                    "INSERT INTO case_messages (id, case_id, message_text, sender, timestamp)
                     VALUES (?1, ?2, ?3, ?4, {NOW_SQL})"
                ),
                params![id, case_id, text, sender.to_string()],
            )?;
            let message = tx.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM case_messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )?;
            tx.commit()?;
            Ok(Some(message))
        })
        .await
        .map_err(map_tr_err)?;

    inserted.ok_or_else(|| VivaError::case_not_found(missing_id))
}

/// Messages of a case in conversation order. Empty for an unknown case.
pub async fn get_messages(db: &Database, case_id: &str) -> Result<Vec<CaseMessage>, VivaError> {
    let case_id = case_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM case_messages WHERE case_id = ?1 {MESSAGE_ORDER}"
            ))?;
            let rows = stmt.query_map(params![case_id], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::cases::{create_case, delete_case};
    use viva_core::NewCase;

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        let case = create_case(
            &db,
            &NewCase {
                title: "Neuro".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        append_message(&db, &case.id, "What brings you in?", Sender::Ai)
            .await
            .unwrap();
        let second = append_message(&db, &case.id, "Headache", Sender::User)
            .await
            .unwrap();
        assert_eq!(second.sender, Sender::User);
        assert!(second.turn_index.is_none());

        let messages = get_messages(&db, &case.id).await.unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.message_text.as_str()).collect();
        assert_eq!(texts, vec!["What brings you in?", "Headache"]);
    }

    #[tokio::test]
    async fn append_to_missing_case_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        let err = append_message(&db, "ghost", "hello", Sender::User)
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::NotFound { .. }));
        assert!(get_messages(&db, "ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_case_removes_messages() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        let case = create_case(
            &db,
            &NewCase {
                title: "Renal".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        append_message(&db, &case.id, "note", Sender::System)
            .await
            .unwrap();

        delete_case(&db, &case.id).await.unwrap();
        assert!(get_messages(&db, &case.id).await.unwrap().is_empty());
    }
}
