// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end webhook testing.
//!
//! `TestHarness` assembles the full stack (temp SQLite store, mock provider,
//! webhook processor, axum router) and drives requests through the router
//! with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use secrecy::SecretString;
use tower::ServiceExt;

use viva_config::model::StorageConfig;
use viva_core::{StorageAdapter, VivaError};
use viva_gateway::{AuthConfig, GatewayState, build_router};
use viva_storage::SqliteStorage;
use viva_webhook::{CaseReconciler, WebhookProcessor, signature};

use crate::mock_provider::MockProvider;

/// Signing secret used by every harness.
pub const TEST_SECRET: &str = "wsec_test_harness";
/// Bearer token for the case API.
pub const TEST_API_TOKEN: &str = "test-api-token";
/// Header the harness signs into.
pub const SIGNATURE_HEADER: &str = "x-elevenlabs-signature";

/// A captured HTTP response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub storage: Arc<dyn StorageAdapter>,
    pub router: Router,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub async fn new() -> Result<Self, VivaError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| VivaError::Storage { source: e.into() })?;
        let storage = SqliteStorage::new(StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let provider = Arc::new(MockProvider::new());
        let processor = WebhookProcessor::new(
            SecretString::from(TEST_SECRET.to_string()),
            provider.clone(),
            CaseReconciler::new(storage.clone(), "system"),
        );
        let state = GatewayState::new(
            storage.clone(),
            Arc::new(processor),
            SIGNATURE_HEADER,
            AuthConfig {
                bearer_token: Some(TEST_API_TOKEN.to_string()),
            },
        )?;

        Ok(Self {
            provider,
            storage,
            router: build_router(state),
            _temp_dir: temp_dir,
        })
    }

    /// Signature header value for `body` under [`TEST_SECRET`].
    pub fn sign(body: &[u8]) -> String {
        signature::sign(body, TEST_SECRET.as_bytes())
    }

    /// POSTs a correctly signed webhook delivery.
    pub async fn post_signed(&self, payload: &serde_json::Value) -> Result<TestResponse, VivaError> {
        let body = payload.to_string().into_bytes();
        let signature = Self::sign(&body);
        self.post_webhook(body, Some(&signature)).await
    }

    /// POSTs a webhook delivery with an arbitrary (or no) signature.
    pub async fn post_webhook(
        &self,
        body: Vec<u8>,
        signature: Option<&str>,
    ) -> Result<TestResponse, VivaError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|e| VivaError::Internal(format!("invalid test request: {e}")))?;
        self.send(request).await
    }

    /// Sends any request through the router.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse, VivaError> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| VivaError::Internal(format!("router error: {e}")))?;
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| VivaError::Internal(format!("failed to read body: {e}")))?;
        Ok(TestResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Notification payload with the given id and status.
pub fn notification(conversation_id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "conversation_id": conversation_id,
        "agent_id": "agent-test",
        "status": status,
        "created_at": "2026-01-01T00:00:00Z"
    })
}
