// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for case persistence.

use async_trait::async_trait;

use crate::error::VivaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Case, CaseMessage, CaseUpdate, NewCase, ReconcileOutcome, Reconciliation, Sender,
};

/// Adapter for the case store.
///
/// Both write paths, client calls through the case API and webhook
/// reconciliation, go through this trait.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), VivaError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), VivaError>;

    // --- Case operations ---

    /// Creates a case and returns the stored row.
    ///
    /// Fails with [`VivaError::Conflict`] when the conversation id is already linked.
    async fn create_case(&self, case: &NewCase) -> Result<Case, VivaError>;

    /// Gets a case by id.
    async fn get_case(&self, id: &str) -> Result<Option<Case>, VivaError>;

    /// Gets the case linked to a provider conversation.
    async fn find_case_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Case>, VivaError>;

    /// Lists cases newest first, optionally restricted to one owner.
    async fn list_cases(&self, user_id: Option<&str>) -> Result<Vec<Case>, VivaError>;

    /// Applies a partial update and bumps `updated_at`.
    async fn update_case(&self, id: &str, update: &CaseUpdate) -> Result<Case, VivaError>;

    /// Deletes a case and its messages. Returns `false` if it did not exist.
    async fn delete_case(&self, id: &str) -> Result<bool, VivaError>;

    // --- Message operations ---

    /// Appends a client-authored message to a case.
    async fn append_message(
        &self,
        case_id: &str,
        text: &str,
        sender: Sender,
    ) -> Result<CaseMessage, VivaError>;

    /// Gets the messages of a case in timestamp order.
    async fn get_messages(&self, case_id: &str) -> Result<Vec<CaseMessage>, VivaError>;

    // --- Reconciliation ---

    /// Merges an ended conversation into the store as one atomic unit:
    /// find-or-create the case, write transcript and metadata, and insert the
    /// turns only when the case has no messages yet.
    async fn reconcile_conversation(
        &self,
        reconciliation: &Reconciliation,
    ) -> Result<ReconcileOutcome, VivaError>;
}
