// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Case API handlers (bearer-authenticated).
//!
//! The client's write path: create and edit cases, link a conversation id,
//! append messages. Writes share the storage single writer with webhook
//! reconciliation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use viva_core::{Case, CaseUpdate, CaseWithMessages, NewCase, Sender, VivaError};

use crate::handlers::{ApiError, error_response};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct ListCasesQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaseListResponse {
    pub cases: Vec<CaseWithMessages>,
}

/// Returned by the create endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewMessageRequest {
    pub text: String,
    pub sender: Sender,
}

async fn with_messages(state: &GatewayState, case: Case) -> Result<CaseWithMessages, VivaError> {
    let messages = state.storage.get_messages(&case.id).await?;
    Ok(CaseWithMessages { case, messages })
}

/// GET /v1/cases
pub async fn list_cases(
    State(state): State<GatewayState>,
    Query(query): Query<ListCasesQuery>,
) -> Result<Json<CaseListResponse>, ApiError> {
    let cases = state.storage.list_cases(query.user_id.as_deref()).await?;
    let mut out = Vec::with_capacity(cases.len());
    for case in cases {
        out.push(with_messages(&state, case).await?);
    }
    Ok(Json(CaseListResponse { cases: out }))
}

/// POST /v1/cases
pub async fn create_case(
    State(state): State<GatewayState>,
    Json(body): Json<NewCase>,
) -> Result<Response, ApiError> {
    if body.title.trim().is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "title must not be empty"));
    }
    let case = state.storage.create_case(&body).await?;
    tracing::info!(case_id = %case.id, "case created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: case.id })).into_response())
}

/// GET /v1/cases/{id}
pub async fn get_case(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<CaseWithMessages>, ApiError> {
    let case = state
        .storage
        .get_case(&id)
        .await?
        .ok_or_else(|| VivaError::case_not_found(&id))?;
    Ok(Json(with_messages(&state, case).await?))
}

/// PATCH /v1/cases/{id}
pub async fn update_case(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<CaseUpdate>,
) -> Result<Response, ApiError> {
    if body.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "no fields to update"));
    }
    let case = state.storage.update_case(&id, &body).await?;
    Ok(Json(case).into_response())
}

/// DELETE /v1/cases/{id}
pub async fn delete_case(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_case(&id).await? {
        tracing::info!(case_id = %id, "case deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(VivaError::case_not_found(id).into())
    }
}

/// POST /v1/cases/{id}/messages
pub async fn append_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<NewMessageRequest>,
) -> Result<Response, ApiError> {
    if body.text.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "text must not be empty"));
    }
    let message = state
        .storage
        .append_message(&id, &body.text, body.sender)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: message.id })).into_response())
}
