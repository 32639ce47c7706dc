// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Viva webhook service.

use thiserror::Error;

/// The primary error type used across all Viva adapter traits and core operations.
#[derive(Debug, Error)]
pub enum VivaError {
    /// Configuration errors (missing secrets, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Voice provider errors (API failure, unexpected response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A webhook body passed signature verification but could not be decoded.
    #[error("invalid webhook payload: {0}")]
    Payload(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A write would violate a uniqueness rule (e.g. a conversation id already linked).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VivaError {
    /// Shorthand for a [`VivaError::NotFound`] on a case id.
    pub fn case_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "case".to_string(),
            id: id.into(),
        }
    }
}
