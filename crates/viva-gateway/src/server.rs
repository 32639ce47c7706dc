// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    middleware as axum_middleware,
    routing::{MethodRouter, get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use viva_core::{StorageAdapter, VivaError};
use viva_webhook::WebhookProcessor;

use crate::auth::{AuthConfig, auth_middleware};
use crate::{cases, handlers, webhook};

/// Headers the webhook allows cross-origin callers to send.
const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Paths the webhook handler is mounted at.
pub const WEBHOOK_PATHS: [&str; 2] = ["/", "/v1/webhooks/elevenlabs"];

/// Process start time for the health endpoint.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub storage: Arc<dyn StorageAdapter>,
    pub webhook: Arc<WebhookProcessor>,
    /// Header carrying the webhook signature.
    pub signature_header: HeaderName,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        webhook: Arc<WebhookProcessor>,
        signature_header: &str,
        auth: AuthConfig,
    ) -> Result<Self, VivaError> {
        let signature_header = HeaderName::from_bytes(signature_header.as_bytes()).map_err(|e| {
            VivaError::Config(format!("invalid signature header `{signature_header}`: {e}"))
        })?;
        Ok(Self {
            storage,
            webhook,
            signature_header,
            auth,
            health: HealthState {
                start_time: Instant::now(),
            },
        })
    }
}

/// Bind address for [`start_server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the full application router.
///
/// - `POST|OPTIONS /` and `/v1/webhooks/elevenlabs` (signature auth, CORS)
/// - `GET /health` (no auth)
/// - `/v1/cases...` (bearer auth)
pub fn build_router(state: GatewayState) -> Router {
    let webhook_method: MethodRouter<GatewayState> = post(webhook::receive)
        .options(webhook::preflight)
        .fallback(webhook::method_not_allowed);

    let mut webhook_routes = Router::new();
    for path in WEBHOOK_PATHS {
        webhook_routes = webhook_routes.route(path, webhook_method.clone());
    }
    let webhook_routes = webhook_routes
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/cases", get(cases::list_cases).post(cases::create_case))
        .route(
            "/v1/cases/{id}",
            get(cases::get_case)
                .patch(cases::update_case)
                .delete(cases::delete_case),
        )
        .route("/v1/cases/{id}/messages", post(cases::append_message))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(webhook_routes)
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Binds and serves until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), VivaError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VivaError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| VivaError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
