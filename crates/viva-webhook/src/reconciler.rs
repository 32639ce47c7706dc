// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges an ended conversation onto its case.
//!
//! [`build_reconciliation`] decides what to write (transcript fallback, title,
//! owner, turn mapping); [`CaseReconciler`] hands that to the store, which
//! applies it in one transaction.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;
use viva_core::{
    ConversationDetail, ConversationNotification, ReconcileOutcome, Reconciliation, Sender,
    StorageAdapter, TurnRecord, VivaError,
};

const TITLE_SNIPPET_CHARS: usize = 48;

/// Applies reconciliations through a [`StorageAdapter`].
pub struct CaseReconciler {
    storage: Arc<dyn StorageAdapter>,
    placeholder_owner: String,
}

impl CaseReconciler {
    pub fn new(storage: Arc<dyn StorageAdapter>, placeholder_owner: impl Into<String>) -> Self {
        Self {
            storage,
            placeholder_owner: placeholder_owner.into(),
        }
    }

    pub async fn reconcile(
        &self,
        notification: &ConversationNotification,
        detail: Option<&ConversationDetail>,
    ) -> Result<ReconcileOutcome, VivaError> {
        let rec = build_reconciliation(notification, detail, &self.placeholder_owner, Utc::now());
        let outcome = self.storage.reconcile_conversation(&rec).await?;
        info!(
            conversation_id = %notification.conversation_id,
            case_id = %outcome.case_id,
            created = outcome.created,
            messages_inserted = outcome.messages_inserted,
            messages_count = outcome.messages_count,
            "case reconciled"
        );
        Ok(outcome)
    }
}

/// Builds the store-level write for one ended conversation.
///
/// Transcript precedence: fetched detail, then the notification's own
/// transcript; empty strings count as absent. When neither has text the
/// result carries `None` so an existing case keeps what it has.
pub fn build_reconciliation(
    notification: &ConversationNotification,
    detail: Option<&ConversationDetail>,
    placeholder_owner: &str,
    now: DateTime<Utc>,
) -> Reconciliation {
    let transcript = detail
        .map(|d| d.transcript.as_str())
        .filter(|t| !t.is_empty())
        .or_else(|| notification.transcript.as_deref().filter(|t| !t.is_empty()))
        .map(str::to_string);

    let audio_url = detail
        .and_then(|d| d.audio_url.clone())
        .or_else(|| notification.audio_url.clone());

    let owner = notification
        .user_id
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(placeholder_owner)
        .to_string();

    let turns = detail
        .map(|d| {
            d.turns
                .iter()
                .enumerate()
                .map(|(i, turn)| TurnRecord {
                    index: i as i64,
                    text: turn.content.clone(),
                    sender: Sender::from(turn.role),
                    timestamp: turn.timestamp.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Reconciliation {
        conversation_id: notification.conversation_id.clone(),
        title: case_title(transcript.as_deref(), now),
        transcript,
        audio_url,
        duration_seconds: detail.and_then(|d| d.duration_seconds),
        owner,
        turns,
    }
}

/// Title for a case created from a conversation: the first transcript line,
/// or the time when there is no text.
pub fn case_title(transcript: Option<&str>, now: DateTime<Utc>) -> String {
    let first_line = transcript
        .and_then(|t| t.lines().map(str::trim).find(|line| !line.is_empty()));
    match first_line {
        Some(line) => {
            let mut snippet: String = line.chars().take(TITLE_SNIPPET_CHARS).collect();
            if line.chars().count() > TITLE_SNIPPET_CHARS {
                snippet = format!("{}…", snippet.trim_end());
            }
            format!("Voice session: {snippet}")
        }
        None => format!(
            "Voice session {}",
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use viva_core::{ConversationTurn, NotificationStatus, TurnRole};

    fn notification() -> ConversationNotification {
        ConversationNotification {
            conversation_id: "conv-1".into(),
            agent_id: "agent-1".into(),
            status: NotificationStatus::ConversationEnded,
            transcript: Some("partial".into()),
            audio_url: Some("https://cdn.example/partial.mp3".into()),
            user_id: None,
            created_at: None,
            metadata: None,
        }
    }

    fn detail() -> ConversationDetail {
        ConversationDetail {
            transcript: "Hello\nHi there".into(),
            audio_url: None,
            duration_seconds: Some(30),
            turns: vec![
                ConversationTurn {
                    role: TurnRole::User,
                    content: "Hello".into(),
                    timestamp: None,
                },
                ConversationTurn {
                    role: TurnRole::Assistant,
                    content: "Hi there".into(),
                    timestamp: Some("2026-01-01T00:00:02Z".into()),
                },
            ],
        }
    }

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn detail_transcript_wins() {
        let rec = build_reconciliation(&notification(), Some(&detail()), "system", at_noon());
        assert_eq!(rec.transcript.as_deref(), Some("Hello\nHi there"));
        assert_eq!(rec.duration_seconds, Some(30));
        // Detail has no audio, so the notification's is used.
        assert_eq!(rec.audio_url.as_deref(), Some("https://cdn.example/partial.mp3"));
        assert_eq!(rec.owner, "system");
        assert_eq!(rec.turns.len(), 2);
        assert_eq!(rec.turns[0].sender, Sender::User);
        assert_eq!(rec.turns[1].sender, Sender::Ai);
        assert_eq!(rec.turns[1].index, 1);
    }

    #[test]
    fn falls_back_to_notification_transcript() {
        let rec = build_reconciliation(&notification(), None, "system", at_noon());
        assert_eq!(rec.transcript.as_deref(), Some("partial"));
        assert!(rec.turns.is_empty());
    }

    #[test]
    fn empty_detail_transcript_counts_as_absent() {
        let empty = ConversationDetail::default();
        let rec = build_reconciliation(&notification(), Some(&empty), "system", at_noon());
        assert_eq!(rec.transcript.as_deref(), Some("partial"));
    }

    #[test]
    fn no_text_anywhere_leaves_transcript_unset() {
        let mut n = notification();
        n.transcript = None;
        let rec = build_reconciliation(&n, None, "system", at_noon());
        assert!(rec.transcript.is_none());
        assert_eq!(rec.title, "Voice session 2026-05-04T12:00:00Z");
    }

    #[test]
    fn notification_user_id_overrides_placeholder() {
        let mut n = notification();
        n.user_id = Some("student-42".into());
        let rec = build_reconciliation(&n, None, "system", at_noon());
        assert_eq!(rec.owner, "student-42");
    }

    #[test]
    fn title_uses_first_non_empty_line() {
        assert_eq!(
            case_title(Some("\n  Hello\nHi there"), at_noon()),
            "Voice session: Hello"
        );
    }

    #[test]
    fn long_title_is_truncated() {
        let line = "a".repeat(80);
        let title = case_title(Some(&line), at_noon());
        assert_eq!(title, format!("Voice session: {}…", "a".repeat(48)));
    }
}
