// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for case, message, and reconciliation operations.

pub mod cases;
pub mod messages;
pub mod reconcile;

use rusqlite::types::Type;
use viva_core::{Case, CaseMessage, Sender};

pub(crate) const CASE_COLUMNS: &str = "id, user_id, title, transcript, audio_file_url, duration_seconds, case_notes, conversation_id, created_at, updated_at";

pub(crate) const MESSAGE_COLUMNS: &str =
    "id, case_id, message_text, sender, timestamp, created_at, turn_index";

pub(crate) fn case_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Case> {
    Ok(Case {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        transcript: row.get(3)?,
        audio_file_url: row.get(4)?,
        duration_seconds: row.get(5)?,
        case_notes: row.get(6)?,
        conversation_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaseMessage> {
    let sender: String = row.get(3)?;
    let sender = sender
        .parse::<Sender>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(CaseMessage {
        id: row.get(0)?,
        case_id: row.get(1)?,
        message_text: row.get(2)?,
        sender,
        timestamp: row.get(4)?,
        created_at: row.get(5)?,
        turn_index: row.get(6)?,
    })
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
