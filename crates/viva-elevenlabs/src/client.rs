// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the ElevenLabs Conversational AI API.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;
use viva_core::VivaError;

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Thin client over the conversation endpoints.
///
/// Holds a pooled `reqwest::Client` with the `xi-api-key` header and the
/// request timeout baked in.
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ElevenLabsClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, VivaError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| VivaError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("xi-api-key", key);
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let base_url = Url::parse(base_url)
            .map_err(|e| VivaError::Config(format!("invalid elevenlabs.base_url `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(VivaError::Config(format!(
                "elevenlabs.base_url `{base_url}` cannot be used as a base URL"
            )));
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| VivaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// URL of the conversation record; the id is percent-encoded as one path segment.
    pub fn conversation_url(&self, conversation_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "convai", "conversations", conversation_id]);
        }
        url
    }

    /// Fetches the raw conversation JSON.
    ///
    /// Non-success statuses, transport failures, and non-JSON bodies are all errors.
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<serde_json::Value, VivaError> {
        let url = self.conversation_url(conversation_id);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "HTTP request failed"))?;

        let status = response.status();
        debug!(status = %status, conversation_id, "conversation response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VivaError::Provider {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, "failed to read response body"))?;
        serde_json::from_str(&body).map_err(|e| VivaError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    fn transport_error(&self, e: reqwest::Error, context: &str) -> VivaError {
        if e.is_timeout() {
            VivaError::Timeout {
                duration: self.timeout,
            }
        } else {
            VivaError::Provider {
                message: format!("{context}: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> ElevenLabsClient {
        ElevenLabsClient::new("xi-test-key", base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn conversation_url_joins_segments() {
        let client = test_client("https://api.elevenlabs.io/");
        assert_eq!(
            client.conversation_url("conv_1").as_str(),
            "https://api.elevenlabs.io/v1/convai/conversations/conv_1"
        );
    }

    #[test]
    fn conversation_url_encodes_id() {
        let client = test_client("http://localhost:9000");
        let url = client.conversation_url("a/b c");
        assert!(url.as_str().ends_with("/conversations/a%2Fb%20c"), "got {url}");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let err = ElevenLabsClient::new("k", "not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, VivaError::Config(_)));
    }

    #[tokio::test]
    async fn sends_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/convai/conversations/conv_h"))
            .and(header("xi-api-key", "xi-test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"transcript": "hi"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = test_client(&server.uri())
            .get_conversation("conv_h")
            .await
            .unwrap();
        assert_eq!(body["transcript"], "hi");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .get_conversation("missing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"), "got: {err}");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            ElevenLabsClient::new("k", &server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.get_conversation("slow").await.unwrap_err();
        assert!(
            matches!(err, VivaError::Timeout { duration } if duration == Duration::from_millis(50)),
            "got: {err}"
        );
    }
}
