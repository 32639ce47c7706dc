// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the webhook pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Provider,
    Gateway,
}

// --- Webhook notification ---

/// Lifecycle status carried by a provider notification.
///
/// Unrecognized status strings deserialize to [`NotificationStatus::Unknown`]
/// so a new provider event type is acknowledged instead of failing the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationStatus {
    ConversationStarted,
    ConversationEnded,
    ConversationError,
    #[serde(other)]
    Unknown,
}

/// A conversation lifecycle event posted by the voice provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationNotification {
    /// Provider-assigned conversation id, stable across notifications.
    pub conversation_id: String,
    #[serde(default)]
    pub agent_id: String,
    pub status: NotificationStatus,
    /// Possibly partial transcript included with the event.
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    /// Account the conversation was started for, when the client passed one through.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ConversationNotification {
    /// Whether this notification should trigger reconciliation.
    pub fn is_ended(&self) -> bool {
        self.status == NotificationStatus::ConversationEnded
    }
}

// --- Provider conversation detail ---

/// Speaker of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Maps a provider role string; anything other than `user` is the agent.
    pub fn from_provider(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

/// One utterance in a provider conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Authoritative conversation record fetched from the voice provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// Full transcript; empty when the provider returned neither text nor turns.
    pub transcript: String,
    pub audio_url: Option<String>,
    pub duration_seconds: Option<i64>,
    /// Turns in conversation order.
    pub turns: Vec<ConversationTurn>,
}

// --- Cases ---

/// Author of a persisted case message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

impl From<TurnRole> for Sender {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Sender::User,
            TurnRole::Assistant => Sender::Ai,
        }
    }
}

/// A persisted practice exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    /// Owning account; a placeholder when the webhook created the case.
    pub user_id: Option<String>,
    pub title: String,
    pub transcript: String,
    pub audio_file_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub case_notes: Option<String>,
    /// Join key to provider notifications; unique when set.
    pub conversation_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted message belonging to a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMessage {
    pub id: String,
    pub case_id: String,
    pub message_text: String,
    pub sender: Sender,
    pub timestamp: String,
    pub created_at: String,
    /// Position of the provider turn this row was written from. `None` for
    /// messages appended by the client.
    pub turn_index: Option<i64>,
}

/// A case together with its messages in timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseWithMessages {
    #[serde(flatten)]
    pub case: Case,
    pub messages: Vec<CaseMessage>,
}

/// Fields for a client-created case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCase {
    pub title: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Partial update of a case. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub case_notes: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl CaseUpdate {
    /// True when the update would not change any column.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.transcript.is_none()
            && self.case_notes.is_none()
            && self.conversation_id.is_none()
    }
}

// --- Reconciliation ---

/// A provider turn prepared for insertion as a case message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    pub index: i64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: Option<String>,
}

/// Everything the store needs to reconcile one ended conversation.
///
/// Applied atomically by [`crate::StorageAdapter::reconcile_conversation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub conversation_id: String,
    /// Transcript to write. `None` keeps an existing case's transcript, or
    /// writes an empty one on creation.
    pub transcript: Option<String>,
    pub audio_url: Option<String>,
    pub duration_seconds: Option<i64>,
    /// Title used only when a new case has to be created.
    pub title: String,
    /// Owner used only when a new case has to be created.
    pub owner: String,
    pub turns: Vec<TurnRecord>,
}

/// Result of reconciling a conversation onto a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub case_id: String,
    /// Whether the case was created by this reconciliation.
    pub created: bool,
    /// Transcript persisted on the case after reconciliation.
    pub transcript: String,
    pub audio_url: Option<String>,
    pub duration_seconds: Option<i64>,
    /// Rows written by this call (0 on a repeated delivery).
    pub messages_inserted: usize,
    /// Total message rows on the case after reconciliation.
    pub messages_count: usize,
}
