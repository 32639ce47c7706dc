// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Viva webhook service.
//!
//! This crate provides the trait definitions, error type, and domain types
//! (notifications, conversation details, cases) used throughout the Viva
//! workspace. Storage and provider adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VivaError;
pub use types::{
    AdapterType, Case, CaseMessage, CaseUpdate, CaseWithMessages, ConversationDetail,
    ConversationNotification, ConversationTurn, HealthStatus, NewCase, NotificationStatus,
    ReconcileOutcome, Reconciliation, Sender, TurnRecord, TurnRole,
};

pub use traits::{ConversationProvider, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viva_error_messages() {
        let not_found = VivaError::case_not_found("case-1");
        assert_eq!(not_found.to_string(), "case not found: case-1");

        let payload = VivaError::Payload("expected value at line 1".into());
        assert!(payload.to_string().starts_with("invalid webhook payload"));

        let storage = VivaError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert_eq!(storage.to_string(), "storage error: disk full");

        let timeout = VivaError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        assert!(timeout.to_string().contains("30s"));
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Provider, AdapterType::Gateway] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn notification_parses_provider_payload() {
        let json = r#"{
            "conversation_id": "conv-1",
            "agent_id": "agent-9",
            "status": "conversation_ended",
            "transcript": "partial",
            "created_at": "2026-01-01T00:00:00Z",
            "metadata": {"exam": "surgery"}
        }"#;
        let n: ConversationNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.conversation_id, "conv-1");
        assert_eq!(n.status, NotificationStatus::ConversationEnded);
        assert!(n.is_ended());
        assert_eq!(n.transcript.as_deref(), Some("partial"));
        assert!(n.user_id.is_none());
    }

    #[test]
    fn unknown_status_is_not_an_error() {
        let json = r#"{"conversation_id": "c", "status": "conversation_paused"}"#;
        let n: ConversationNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.status, NotificationStatus::Unknown);
        assert!(!n.is_ended());
    }

    #[test]
    fn status_display_matches_wire_name() {
        assert_eq!(
            NotificationStatus::ConversationStarted.to_string(),
            "conversation_started"
        );
        assert_eq!(NotificationStatus::ConversationError.to_string(), "conversation_error");
    }

    #[test]
    fn turn_role_maps_to_sender() {
        assert_eq!(Sender::from(TurnRole::from_provider("user")), Sender::User);
        assert_eq!(Sender::from(TurnRole::from_provider("assistant")), Sender::Ai);
        assert_eq!(Sender::from(TurnRole::from_provider("agent")), Sender::Ai);
    }

    #[test]
    fn sender_wire_format_is_lowercase() {
        use std::str::FromStr;

        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), "\"ai\"");
        assert_eq!(Sender::from_str("system").unwrap(), Sender::System);
        assert!(Sender::from_str("robot").is_err());
    }

    #[test]
    fn case_update_emptiness() {
        assert!(CaseUpdate::default().is_empty());
        let update = CaseUpdate {
            conversation_id: Some("conv-1".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_conversation_provider<T: ConversationProvider>() {}
    }
}
