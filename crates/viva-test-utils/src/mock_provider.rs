// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock conversation provider for deterministic testing.
//!
//! `MockProvider` implements `ConversationProvider` with canned details keyed
//! by conversation id. Unknown ids behave like a failed fetch (`None`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use viva_core::{
    AdapterType, ConversationDetail, ConversationProvider, ConversationTurn, HealthStatus,
    PluginAdapter, TurnRole, VivaError,
};

/// A mock provider that serves pre-configured conversation details.
#[derive(Default)]
pub struct MockProvider {
    details: Arc<Mutex<HashMap<String, ConversationDetail>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the detail returned for `conversation_id`.
    pub async fn set_detail(&self, conversation_id: &str, detail: ConversationDetail) {
        self.details
            .lock()
            .await
            .insert(conversation_id.to_string(), detail);
    }

    /// Conversation ids fetched so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

/// Builds a detail whose transcript is the turn contents joined by newlines.
/// Turns alternate user / assistant starting with the user.
pub fn detail_from_lines(lines: &[&str]) -> ConversationDetail {
    let turns = lines
        .iter()
        .enumerate()
        .map(|(i, line)| ConversationTurn {
            role: if i % 2 == 0 {
                TurnRole::User
            } else {
                TurnRole::Assistant
            },
            content: (*line).to_string(),
            timestamp: None,
        })
        .collect();
    ConversationDetail {
        transcript: lines.join("\n"),
        audio_url: None,
        duration_seconds: None,
        turns,
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, VivaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VivaError> {
        Ok(())
    }
}

#[async_trait]
impl ConversationProvider for MockProvider {
    async fn fetch_conversation(&self, conversation_id: &str) -> Option<ConversationDetail> {
        self.calls.lock().await.push(conversation_id.to_string());
        self.details.lock().await.get(conversation_id).cloned()
    }
}
