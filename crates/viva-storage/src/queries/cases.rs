// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case CRUD operations.

use rusqlite::{OptionalExtension, params};
use viva_core::{Case, CaseUpdate, NewCase, VivaError};

use super::{CASE_COLUMNS, case_from_row, new_id};
use crate::database::{Database, NOW_SQL, map_tr_err};

/// Result of a write that can trip a uniqueness rule or miss its row.
enum WriteOutcome {
    Done(Case),
    Conflict,
    Missing,
}

fn conversation_conflict(conversation_id: &str) -> VivaError {
    VivaError::Conflict(format!(
        "conversation {conversation_id} is already linked to a case"
    ))
}

fn select_case(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Case>> {
    conn.query_row(
        &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1"),
        params![id],
        case_from_row,
    )
    .optional()
}

fn linked_case_id(
    conn: &rusqlite::Connection,
    conversation_id: &str,
) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM cases WHERE conversation_id = ?1",
        params![conversation_id],
        |row| row.get(0),
    )
    .optional()
}

/// Create a case with an empty transcript.
pub async fn create_case(db: &Database, new_case: &NewCase) -> Result<Case, VivaError> {
    let new_case = new_case.clone();
    let conversation_id = new_case.conversation_id.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(cid) = &new_case.conversation_id
                && linked_case_id(&tx, cid)?.is_some()
            {
                return Ok(WriteOutcome::Conflict);
            }
            let id = new_id();
            tx.execute(
                "INSERT INTO cases (id, user_id, title, conversation_id) VALUES (?1, ?2, ?3, ?4)",
                params![id, new_case.user_id, new_case.title, new_case.conversation_id],
            )?;
            let case = select_case(&tx, &id)?;
            tx.commit()?;
            Ok(match case {
                Some(case) => WriteOutcome::Done(case),
                None => WriteOutcome::Missing,
            })
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        WriteOutcome::Done(case) => Ok(case),
        WriteOutcome::Conflict => Err(conversation_conflict(
            conversation_id.as_deref().unwrap_or_default(),
        )),
        WriteOutcome::Missing => Err(VivaError::Internal(
            "inserted case could not be read back".to_string(),
        )),
    }
}

/// Get a case by ID.
pub async fn get_case(db: &Database, id: &str) -> Result<Option<Case>, VivaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_case(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Get the case linked to a provider conversation.
pub async fn find_case_by_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<Option<Case>, VivaError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE conversation_id = ?1"),
                params![conversation_id],
                case_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List cases newest first, optionally filtered by owner.
pub async fn list_cases(db: &Database, user_id: Option<&str>) -> Result<Vec<Case>, VivaError> {
    let user_id = user_id.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut cases = Vec::new();
            match &user_id {
                Some(owner) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {CASE_COLUMNS} FROM cases WHERE user_id = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    for row in stmt.query_map(params![owner], case_from_row)? {
                        cases.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    for row in stmt.query_map([], case_from_row)? {
                        cases.push(row?);
                    }
                }
            }
            Ok(cases)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update. Columns whose field is `None` keep their value.
pub async fn update_case(
    db: &Database,
    id: &str,
    update: &CaseUpdate,
) -> Result<Case, VivaError> {
    let id = id.to_string();
    let case_id = id.clone();
    let update = update.clone();
    let conversation_id = update.conversation_id.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if select_case(&tx, &id)?.is_none() {
                return Ok(WriteOutcome::Missing);
            }
            if let Some(cid) = &update.conversation_id
                && let Some(owner) = linked_case_id(&tx, cid)?
                && owner != id
            {
                return Ok(WriteOutcome::Conflict);
            }
            tx.execute(
                &format!(
                    "UPDATE cases SET
                        title = COALESCE(?2, title),
                        transcript = COALESCE(?3, transcript),
                        case_notes = COALESCE(?4, case_notes),
                        conversation_id = COALESCE(?5, conversation_id),
                        updated_at = {NOW_SQL}
                     WHERE id = ?1"
                ),
                params![
                    id,
                    update.title,
                    update.transcript,
                    update.case_notes,
                    update.conversation_id,
                ],
            )?;
            let case = select_case(&tx, &id)?;
            tx.commit()?;
            Ok(match case {
                Some(case) => WriteOutcome::Done(case),
                None => WriteOutcome::Missing,
            })
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        WriteOutcome::Done(case) => Ok(case),
        WriteOutcome::Conflict => Err(conversation_conflict(
            conversation_id.as_deref().unwrap_or_default(),
        )),
        WriteOutcome::Missing => Err(VivaError::case_not_found(case_id)),
    }
}

/// Delete a case; its messages go with it through the foreign key cascade.
pub async fn delete_case(db: &Database, id: &str) -> Result<bool, VivaError> {
    let id = id.to_string();
    let deleted = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM cases WHERE id = ?1", params![id]))
        .await
        .map_err(map_tr_err)?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn new_case(title: &str, user: &str, conversation: Option<&str>) -> NewCase {
        NewCase {
            title: title.to_string(),
            user_id: Some(user.to_string()),
            conversation_id: conversation.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_and_get_case() {
        let (db, _dir) = open_db().await;
        let created = create_case(&db, &new_case("Cardiology", "u1", Some("conv_1")))
            .await
            .unwrap();
        assert_eq!(created.title, "Cardiology");
        assert_eq!(created.transcript, "");
        assert!(!created.created_at.is_empty());

        let fetched = get_case(&db, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let by_conversation = find_case_by_conversation(&db, "conv_1").await.unwrap();
        assert_eq!(by_conversation.map(|c| c.id), Some(created.id));
    }

    #[tokio::test]
    async fn get_missing_case_returns_none() {
        let (db, _dir) = open_db().await;
        assert!(get_case(&db, "nope").await.unwrap().is_none());
        assert!(find_case_by_conversation(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_conversation_is_a_conflict() {
        let (db, _dir) = open_db().await;
        create_case(&db, &new_case("A", "u1", Some("conv_dup")))
            .await
            .unwrap();
        let err = create_case(&db, &new_case("B", "u2", Some("conv_dup")))
            .await
            .unwrap_err();
        assert!(matches!(err, VivaError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_filters_by_owner() {
        let (db, _dir) = open_db().await;
        create_case(&db, &new_case("A", "u1", None)).await.unwrap();
        create_case(&db, &new_case("B", "u2", None)).await.unwrap();
        let latest = create_case(&db, &new_case("C", "u1", None)).await.unwrap();

        let mine = list_cases(&db, Some("u1")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, latest.id);

        assert_eq!(list_cases(&db, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_keeps_unset_columns() {
        let (db, _dir) = open_db().await;
        let case = create_case(&db, &new_case("Original", "u1", None))
            .await
            .unwrap();

        let updated = update_case(
            &db,
            &case.id,
            &CaseUpdate {
                case_notes: Some("review murmur findings".into()),
                conversation_id: Some("conv_late".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.case_notes.as_deref(), Some("review murmur findings"));
        assert_eq!(updated.conversation_id.as_deref(), Some("conv_late"));
        assert!(updated.updated_at >= case.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_conversation_owned_by_another_case() {
        let (db, _dir) = open_db().await;
        create_case(&db, &new_case("A", "u1", Some("conv_taken")))
            .await
            .unwrap();
        let other = create_case(&db, &new_case("B", "u1", None)).await.unwrap();

        let err = update_case(
            &db,
            &other.id,
            &CaseUpdate {
                conversation_id: Some("conv_taken".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VivaError::Conflict(_)));
    }

    #[tokio::test]
    async fn relinking_same_conversation_is_allowed() {
        let (db, _dir) = open_db().await;
        let case = create_case(&db, &new_case("A", "u1", Some("conv_self")))
            .await
            .unwrap();
        let updated = update_case(
            &db,
            &case.id,
            &CaseUpdate {
                conversation_id: Some("conv_self".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.conversation_id.as_deref(), Some("conv_self"));
    }

    #[tokio::test]
    async fn update_missing_case_is_not_found() {
        let (db, _dir) = open_db().await;
        let err = update_case(
            &db,
            "missing",
            &CaseUpdate {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VivaError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let (db, _dir) = open_db().await;
        let case = create_case(&db, &new_case("A", "u1", None)).await.unwrap();
        assert!(delete_case(&db, &case.id).await.unwrap());
        assert!(!delete_case(&db, &case.id).await.unwrap());
        assert!(get_case(&db, &case.id).await.unwrap().is_none());
    }
}
