// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared response bodies, error mapping, and the health endpoint.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use viva_core::{HealthStatus, VivaError};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unavailable`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body for the case API.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Builds a JSON error response.
pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// A [`VivaError`] rendered as an HTTP error. Lets handlers use `?`.
#[derive(Debug)]
pub struct ApiError(pub VivaError);

impl From<VivaError> for ApiError {
    fn from(err: VivaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "case API request failed");
        }
        error_response(status, self.0.to_string())
    }
}

/// Maps a store or pipeline error onto an HTTP status.
pub fn status_for(err: &VivaError) -> StatusCode {
    match err {
        VivaError::NotFound { .. } => StatusCode::NOT_FOUND,
        VivaError::Conflict(_) => StatusCode::CONFLICT,
        VivaError::Payload(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /health
///
/// Unauthenticated. Runs the storage health check; 503 when it fails.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok"),
        Ok(HealthStatus::Degraded(reason)) => {
            tracing::warn!(%reason, "storage degraded");
            (StatusCode::OK, "degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            tracing::error!(%reason, "storage unhealthy");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
        Err(e) => {
            tracing::error!(error = %e, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.health.start_time.elapsed().as_secs(),
        }),
    )
        .into_response()
}
