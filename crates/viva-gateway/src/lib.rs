// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Viva webhook service.
//!
//! Serves the signed conversation webhook, the bearer-authenticated case API,
//! and an unauthenticated health endpoint.

pub mod auth;
pub mod cases;
pub mod handlers;
pub mod server;
pub mod webhook;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, build_router, start_server};
