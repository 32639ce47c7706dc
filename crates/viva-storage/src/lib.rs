// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite case store for the Viva webhook service.
//!
//! WAL-mode SQLite with embedded refinery migrations. All access goes through
//! a single `tokio-rusqlite` connection, which serializes writes and makes
//! conversation reconciliation a single atomic transaction.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
