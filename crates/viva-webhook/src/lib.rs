// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound conversation webhook for Viva.
//!
//! - [`signature`]: HMAC-SHA256 verification of the raw body
//! - [`reconciler`]: turns a notification plus provider detail into a case write
//! - [`pipeline`]: the end-to-end [`WebhookProcessor`]

pub mod pipeline;
pub mod reconciler;
pub mod signature;

pub use pipeline::{WebhookError, WebhookOutcome, WebhookProcessor, parse_notification};
pub use reconciler::CaseReconciler;
