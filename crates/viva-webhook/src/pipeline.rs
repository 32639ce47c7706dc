// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The webhook pipeline: verify, parse, gate on status, fetch, reconcile.
//!
//! Nothing is parsed or written before the signature checks out. Only
//! `conversation_ended` reaches the provider and the store; every other
//! status is acknowledged as a no-op.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};
use viva_core::{
    ConversationNotification, ConversationProvider, NotificationStatus, ReconcileOutcome,
    VivaError,
};

use crate::reconciler::CaseReconciler;
use crate::signature;

/// Why a delivery was not processed.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    /// Verified delivery that failed while parsing, fetching, or persisting.
    #[error(transparent)]
    Processing(#[from] VivaError),
}

/// Result of a verified delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// Status other than `conversation_ended`; nothing was touched.
    Skipped {
        conversation_id: String,
        status: NotificationStatus,
    },
    Reconciled {
        conversation_id: String,
        outcome: ReconcileOutcome,
    },
}

/// Runs deliveries through the pipeline.
pub struct WebhookProcessor {
    secret: SecretString,
    provider: Arc<dyn ConversationProvider>,
    reconciler: CaseReconciler,
}

impl WebhookProcessor {
    pub fn new(
        secret: SecretString,
        provider: Arc<dyn ConversationProvider>,
        reconciler: CaseReconciler,
    ) -> Self {
        Self {
            secret,
            provider,
            reconciler,
        }
    }

    /// Processes one delivery given its raw body and the raw bytes of the
    /// signature header. A blank header counts as missing; one that is not
    /// UTF-8 is invalid.
    pub async fn process(
        &self,
        raw_body: &[u8],
        signature_header: Option<&[u8]>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let Some(header) = signature_header.filter(|h| !h.trim_ascii().is_empty()) else {
            warn!("webhook rejected: missing signature header");
            return Err(WebhookError::MissingSignature);
        };
        let verified = std::str::from_utf8(header).is_ok_and(|header| {
            signature::verify(raw_body, header, self.secret.expose_secret().as_bytes())
        });
        if !verified {
            warn!("webhook rejected: invalid signature");
            return Err(WebhookError::InvalidSignature);
        }
        debug!("webhook signature verified");

        let notification = parse_notification(raw_body)?;
        let conversation_id = notification.conversation_id.clone();

        if !notification.is_ended() {
            info!(
                conversation_id = %conversation_id,
                status = %notification.status,
                "skipping non-ended conversation notification"
            );
            return Ok(WebhookOutcome::Skipped {
                conversation_id,
                status: notification.status,
            });
        }

        let detail = self.provider.fetch_conversation(&conversation_id).await;
        if detail.is_none() {
            info!(
                conversation_id = %conversation_id,
                "no provider detail, falling back to notification transcript"
            );
        }

        let outcome = self
            .reconciler
            .reconcile(&notification, detail.as_ref())
            .await?;
        Ok(WebhookOutcome::Reconciled {
            conversation_id,
            outcome,
        })
    }
}

/// Decodes a verified body into a notification.
///
/// The conversation id is the reconciliation key, so a blank one is rejected.
pub fn parse_notification(raw_body: &[u8]) -> Result<ConversationNotification, VivaError> {
    let notification: ConversationNotification =
        serde_json::from_slice(raw_body).map_err(|e| VivaError::Payload(e.to_string()))?;
    if notification.conversation_id.trim().is_empty() {
        return Err(VivaError::Payload("conversation_id must not be blank".into()));
    }
    Ok(notification)
}
