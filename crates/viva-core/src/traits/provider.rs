// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation provider trait for the voice service integration.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::ConversationDetail;

/// Read access to the voice provider's conversation records.
#[async_trait]
pub trait ConversationProvider: PluginAdapter {
    /// Fetches the authoritative record of a conversation.
    ///
    /// Returns `None` when the provider cannot supply it (non-success status,
    /// transport failure, undecodable body). Failures are logged by the
    /// implementation and never surfaced as errors, so the caller can fall
    /// back to the notification's own transcript.
    async fn fetch_conversation(&self, conversation_id: &str) -> Option<ConversationDetail>;
}
