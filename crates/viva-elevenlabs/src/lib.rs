// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ElevenLabs Conversational AI provider adapter for Viva.
//!
//! Implements [`ConversationProvider`] by fetching
//! `GET /v1/convai/conversations/{id}` and normalizing the response into a
//! [`ConversationDetail`]. Fetch failures are logged and surface as `None`.

pub mod client;
pub mod normalize;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use viva_config::model::ElevenLabsConfig;
use viva_core::{
    AdapterType, ConversationDetail, ConversationProvider, HealthStatus, PluginAdapter, VivaError,
};

pub use client::ElevenLabsClient;

/// Environment variable consulted when `elevenlabs.api_key` is unset.
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// ElevenLabs provider implementing [`ConversationProvider`].
///
/// API key resolution order: config -> `ELEVENLABS_API_KEY` env var -> error.
pub struct ElevenLabsProvider {
    client: ElevenLabsClient,
}

impl ElevenLabsProvider {
    pub fn new(config: &ElevenLabsConfig) -> Result<Self, VivaError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = ElevenLabsClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "ElevenLabs provider initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for ElevenLabsProvider {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, VivaError> {
        // No cheap unauthenticated endpoint to probe.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VivaError> {
        debug!("ElevenLabs provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ConversationProvider for ElevenLabsProvider {
    async fn fetch_conversation(&self, conversation_id: &str) -> Option<ConversationDetail> {
        let body = match self.client.get_conversation(conversation_id).await {
            Ok(body) => body,
            Err(e) => {
                warn!(conversation_id, error = %e, "conversation fetch failed");
                return None;
            }
        };
        let detail = normalize::normalize(&body);
        match &detail {
            Some(d) => debug!(
                conversation_id,
                transcript_len = d.transcript.chars().count(),
                turns = d.turns.len(),
                "conversation detail fetched"
            ),
            None => warn!(conversation_id, "conversation body was not a JSON object"),
        }
        detail
    }
}

/// Resolves the API key: config value first, then the environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, VivaError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            VivaError::Config(format!(
                "ElevenLabs API key not found. Set elevenlabs.api_key in config or {API_KEY_ENV} environment variable."
            ))
        })
}
