// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Viva integration tests.
//!
//! - [`MockProvider`] - canned conversation details, records fetches
//! - [`TestHarness`] - temp SQLite store + router, signed delivery helpers

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestResponse, notification};
pub use mock_provider::{MockProvider, detail_from_lines};
