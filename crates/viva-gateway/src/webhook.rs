// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the conversation webhook.
//!
//! Mounted at `/` and `/v1/webhooks/elevenlabs`. Every response carries the
//! CORS headers added in [`crate::server::build_router`].

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use viva_webhook::{WebhookError, WebhookOutcome};

use crate::server::GatewayState;

pub const MESSAGE_SKIPPED: &str = "Status not conversation_ended, skipping processing";
pub const MESSAGE_CREATED: &str = "New case created with conversation data";
pub const MESSAGE_UPDATED: &str = "Conversation transcript processed and stored";

/// Body of a successful delivery.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: &'static str,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_count: Option<usize>,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        match outcome {
            WebhookOutcome::Skipped {
                conversation_id, ..
            } => Self {
                success: true,
                message: MESSAGE_SKIPPED,
                conversation_id,
                case_id: None,
                created: None,
                transcript_length: None,
                audio_url: None,
                duration_seconds: None,
                messages_count: None,
            },
            WebhookOutcome::Reconciled {
                conversation_id,
                outcome,
            } => Self {
                success: true,
                message: if outcome.created {
                    MESSAGE_CREATED
                } else {
                    MESSAGE_UPDATED
                },
                conversation_id,
                case_id: Some(outcome.case_id),
                created: Some(outcome.created),
                transcript_length: Some(outcome.transcript.chars().count()),
                audio_url: outcome.audio_url,
                duration_seconds: outcome.duration_seconds,
                messages_count: Some(outcome.messages_count),
            },
        }
    }
}

/// Body of a failed verified delivery.
#[derive(Debug, Serialize)]
pub struct WebhookFailure {
    pub success: bool,
    pub error: String,
}

/// POST: verify, gate, fetch, reconcile.
pub async fn receive(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(&state.signature_header)
        .map(|v| v.as_bytes());

    match state.webhook.process(&body, signature).await {
        Ok(outcome) => (StatusCode::OK, Json(WebhookResponse::from(outcome))).into_response(),
        Err(err @ (WebhookError::MissingSignature | WebhookError::InvalidSignature)) => {
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
        Err(WebhookError::Processing(err)) => {
            tracing::error!(error = %err, "error processing conversation webhook");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookFailure {
                    success: false,
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// OPTIONS: CORS preflight, empty body.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Method not allowed",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use viva_core::{NotificationStatus, ReconcileOutcome};

    #[test]
    fn skipped_response_omits_case_fields() {
        let resp = WebhookResponse::from(WebhookOutcome::Skipped {
            conversation_id: "conv-9".into(),
            status: NotificationStatus::ConversationStarted,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": MESSAGE_SKIPPED,
                "conversation_id": "conv-9"
            })
        );
    }

    #[test]
    fn reconciled_response_counts_characters() {
        let resp = WebhookResponse::from(WebhookOutcome::Reconciled {
            conversation_id: "conv-1".into(),
            outcome: ReconcileOutcome {
                case_id: "case-1".into(),
                created: true,
                transcript: "Hello\nHi there".into(),
                audio_url: None,
                duration_seconds: Some(12),
                messages_inserted: 2,
                messages_count: 2,
            },
        });
        assert_eq!(resp.message, MESSAGE_CREATED);
        assert_eq!(resp.transcript_length, Some(14));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("audio_url").is_none());
        assert_eq!(json["duration_seconds"], 12);
        assert_eq!(json["messages_count"], 2);
    }
}
