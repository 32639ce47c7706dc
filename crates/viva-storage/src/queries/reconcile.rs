// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atomic merge of an ended conversation into the case store.
//!
//! The whole find-or-create, update, and turn insertion runs inside one
//! SQLite transaction on the serialized connection, so two deliveries for the
//! same conversation can never both create a case or both insert turns.

use rusqlite::{OptionalExtension, params};
use tracing::debug;
use viva_core::{ReconcileOutcome, Reconciliation, VivaError};

use super::new_id;
use crate::database::{Database, NOW_SQL, map_tr_err};

/// Find-or-create the case for `rec.conversation_id` and merge the conversation into it.
///
/// - An existing case keeps any column whose new value is `None`.
/// - Turns are written only when the case has no messages at all; each row
///   carries its turn index under `UNIQUE(case_id, turn_index)`.
pub async fn reconcile_conversation(
    db: &Database,
    rec: &Reconciliation,
) -> Result<ReconcileOutcome, VivaError> {
    let conversation_id = rec.conversation_id.clone();
    let rec = rec.clone();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM cases WHERE conversation_id = ?1",
                    params![rec.conversation_id],
                    |row| row.get(0),
                )
                .optional()?;

            let (case_id, created) = match existing {
                Some(id) => {
                    tx.execute(
                        &format!(
                            "UPDATE cases SET
                                transcript = COALESCE(?2, transcript),
                                audio_file_url = COALESCE(?3, audio_file_url),
                                duration_seconds = COALESCE(?4, duration_seconds),
                                updated_at = {NOW_SQL}
                             WHERE id = ?1"
                        ),
                        params![id, rec.transcript, rec.audio_url, rec.duration_seconds],
                    )?;
                    (id, false)
                }
                None => {
                    let id = new_id();
                    tx.execute(
                        "INSERT INTO cases
                            (id, user_id, title, transcript, audio_file_url, duration_seconds, conversation_id)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            id,
                            rec.owner,
                            rec.title,
                            rec.transcript.clone().unwrap_or_default(),
                            rec.audio_url,
                            rec.duration_seconds,
                            rec.conversation_id,
                        ],
                    )?;
                    (id, true)
                }
            };

            let prior: i64 = tx.query_row(
                "SELECT COUNT(*) FROM case_messages WHERE case_id = ?1",
                params![case_id],
                |row| row.get(0),
            )?;

            let mut inserted = 0usize;
            if prior == 0 {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR IGNORE INTO case_messages
                        (id, case_id, message_text, sender, timestamp, turn_index)
                     VALUES (?1, ?2, ?3, ?4, COALESCE(?5, {NOW_SQL}), ?6)"
                ))?;
                for turn in &rec.turns {
                    inserted += stmt.execute(params![
                        new_id(),
                        case_id,
                        turn.text,
                        turn.sender.to_string(),
                        turn.timestamp,
                        turn.index,
                    ])?;
                }
            }

            let (transcript, audio_url, duration_seconds, total): (
                String,
                Option<String>,
                Option<i64>,
                i64,
            ) = tx.query_row(
                "SELECT c.transcript, c.audio_file_url, c.duration_seconds,
                        (SELECT COUNT(*) FROM case_messages m WHERE m.case_id = c.id)
                 FROM cases c WHERE c.id = ?1",
                params![case_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

            tx.commit()?;

            Ok(ReconcileOutcome {
                case_id,
                created,
                transcript,
                audio_url,
                duration_seconds,
                messages_inserted: inserted,
                messages_count: usize::try_from(total).unwrap_or_default(),
            })
        })
        .await
        .map_err(map_tr_err)?;

    debug!(
        conversation_id = %conversation_id,
        case_id = %outcome.case_id,
        created = outcome.created,
        inserted = outcome.messages_inserted,
        "conversation reconciled"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::cases::{create_case, get_case};
    use crate::queries::messages::{append_message, get_messages};
    use viva_core::{NewCase, Sender, TurnRecord};

    async fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("r.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    fn turns() -> Vec<TurnRecord> {
        vec![
            TurnRecord {
                index: 0,
                text: "Hello".into(),
                sender: Sender::User,
                timestamp: Some("2026-01-01T00:00:00Z".into()),
            },
            TurnRecord {
                index: 1,
                text: "Hi there".into(),
                sender: Sender::Ai,
                timestamp: Some("2026-01-01T00:00:02Z".into()),
            },
        ]
    }

    fn reconciliation(conversation_id: &str) -> Reconciliation {
        Reconciliation {
            conversation_id: conversation_id.into(),
            transcript: Some("Hello\nHi there".into()),
            audio_url: Some("https://cdn.example/a.mp3".into()),
            duration_seconds: Some(42),
            title: "Voice session: Hello".into(),
            owner: "system".into(),
            turns: turns(),
        }
    }

    #[tokio::test]
    async fn creates_case_and_inserts_turns() {
        let (db, _dir) = open_db().await;
        let outcome = reconcile_conversation(&db, &reconciliation("conv_new"))
            .await
            .unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.transcript, "Hello\nHi there");
        assert_eq!(outcome.messages_inserted, 2);
        assert_eq!(outcome.messages_count, 2);

        let case = get_case(&db, &outcome.case_id).await.unwrap().unwrap();
        assert_eq!(case.user_id.as_deref(), Some("system"));
        assert_eq!(case.duration_seconds, Some(42));
        assert_eq!(case.conversation_id.as_deref(), Some("conv_new"));

        let messages = get_messages(&db, &outcome.case_id).await.unwrap();
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Ai);
        assert_eq!(messages[1].turn_index, Some(1));
    }

    #[tokio::test]
    async fn repeated_delivery_is_idempotent() {
        let (db, _dir) = open_db().await;
        let first = reconcile_conversation(&db, &reconciliation("conv_twice"))
            .await
            .unwrap();
        let second = reconcile_conversation(&db, &reconciliation("conv_twice"))
            .await
            .unwrap();

        assert_eq!(first.case_id, second.case_id);
        assert!(!second.created);
        assert_eq!(second.messages_inserted, 0);
        assert_eq!(second.messages_count, 2);
        assert_eq!(get_messages(&db, &first.case_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn existing_case_keeps_owner_and_title() {
        let (db, _dir) = open_db().await;
        let case = create_case(
            &db,
            &NewCase {
                title: "Chest pain".into(),
                user_id: Some("student-7".into()),
                conversation_id: Some("conv_linked".into()),
            },
        )
        .await
        .unwrap();

        let outcome = reconcile_conversation(&db, &reconciliation("conv_linked"))
            .await
            .unwrap();
        assert_eq!(outcome.case_id, case.id);
        assert!(!outcome.created);

        let stored = get_case(&db, &case.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Chest pain");
        assert_eq!(stored.user_id.as_deref(), Some("student-7"));
        assert_eq!(stored.transcript, "Hello\nHi there");
        assert_eq!(stored.audio_file_url.as_deref(), Some("https://cdn.example/a.mp3"));
    }

    #[tokio::test]
    async fn turns_skipped_when_case_already_has_messages() {
        let (db, _dir) = open_db().await;
        let case = create_case(
            &db,
            &NewCase {
                title: "Live".into(),
                user_id: Some("u1".into()),
                conversation_id: Some("conv_live".into()),
            },
        )
        .await
        .unwrap();
        append_message(&db, &case.id, "typed by client", Sender::User)
            .await
            .unwrap();

        let outcome = reconcile_conversation(&db, &reconciliation("conv_live"))
            .await
            .unwrap();
        assert_eq!(outcome.messages_inserted, 0);
        assert_eq!(outcome.messages_count, 1);
    }

    #[tokio::test]
    async fn absent_values_do_not_overwrite() {
        let (db, _dir) = open_db().await;
        reconcile_conversation(&db, &reconciliation("conv_keep"))
            .await
            .unwrap();

        let sparse = Reconciliation {
            transcript: None,
            audio_url: None,
            duration_seconds: None,
            turns: Vec::new(),
            ..reconciliation("conv_keep")
        };
        let outcome = reconcile_conversation(&db, &sparse).await.unwrap();
        assert_eq!(outcome.transcript, "Hello\nHi there");
        assert_eq!(outcome.audio_url.as_deref(), Some("https://cdn.example/a.mp3"));
        assert_eq!(outcome.duration_seconds, Some(42));
    }

    #[tokio::test]
    async fn creation_without_transcript_stores_empty_string() {
        let (db, _dir) = open_db().await;
        let rec = Reconciliation {
            transcript: None,
            turns: Vec::new(),
            ..reconciliation("conv_empty")
        };
        let outcome = reconcile_conversation(&db, &rec).await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.transcript, "");
        assert_eq!(outcome.messages_count, 0);
    }

    #[tokio::test]
    async fn concurrent_deliveries_create_one_case() {
        let (db, _dir) = open_db().await;
        let db = std::sync::Arc::new(db);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                reconcile_conversation(&db, &reconciliation("conv_race"))
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.created {
                created += 1;
            }
            ids.push(outcome.case_id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(created, 1);
        assert_eq!(get_messages(&db, &ids[0]).await.unwrap().len(), 2);
    }
}
