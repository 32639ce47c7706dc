// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use viva_config::model::StorageConfig;
use viva_core::{
    AdapterType, Case, CaseMessage, CaseUpdate, HealthStatus, NewCase, PluginAdapter,
    ReconcileOutcome, Reconciliation, Sender, StorageAdapter, VivaError,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed case store.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, VivaError> {
        self.db.get().ok_or_else(|| VivaError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), VivaError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VivaError> {
        let Some(db) = self.db.get() else {
            return Err(VivaError::HealthCheckFailed {
                name: self.name().to_string(),
                source: "storage not initialized".into(),
            });
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(|e| VivaError::HealthCheckFailed {
                name: self.name().to_string(),
                source: Box::new(e),
            })?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VivaError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), VivaError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| VivaError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite case store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), VivaError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Case operations ---

    async fn create_case(&self, case: &NewCase) -> Result<Case, VivaError> {
        queries::cases::create_case(self.db()?, case).await
    }

    async fn get_case(&self, id: &str) -> Result<Option<Case>, VivaError> {
        queries::cases::get_case(self.db()?, id).await
    }

    async fn find_case_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Case>, VivaError> {
        queries::cases::find_case_by_conversation(self.db()?, conversation_id).await
    }

    async fn list_cases(&self, user_id: Option<&str>) -> Result<Vec<Case>, VivaError> {
        queries::cases::list_cases(self.db()?, user_id).await
    }

    async fn update_case(&self, id: &str, update: &CaseUpdate) -> Result<Case, VivaError> {
        queries::cases::update_case(self.db()?, id, update).await
    }

    async fn delete_case(&self, id: &str) -> Result<bool, VivaError> {
        queries::cases::delete_case(self.db()?, id).await
    }

    // --- Message operations ---

    async fn append_message(
        &self,
        case_id: &str,
        text: &str,
        sender: Sender,
    ) -> Result<CaseMessage, VivaError> {
        queries::messages::append_message(self.db()?, case_id, text, sender).await
    }

    async fn get_messages(&self, case_id: &str) -> Result<Vec<CaseMessage>, VivaError> {
        queries::messages::get_messages(self.db()?, case_id).await
    }

    // --- Reconciliation ---

    async fn reconcile_conversation(
        &self,
        reconciliation: &Reconciliation,
    ) -> Result<ReconcileOutcome, VivaError> {
        queries::reconcile::reconcile_conversation(self.db()?, reconciliation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_identity() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_creates_database_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let storage = SqliteStorage::new(make_config("never-opened.db"));
        assert!(matches!(
            storage.health_check().await,
            Err(VivaError::HealthCheckFailed { ref name, .. }) if name == "sqlite"
        ));
        assert!(matches!(
            storage.get_case("x").await,
            Err(VivaError::Storage { .. })
        ));
        // Nothing to checkpoint yet.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn case_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let case = storage
            .create_case(&NewCase {
                title: "Abdominal pain".into(),
                user_id: Some("student-1".into()),
                conversation_id: None,
            })
            .await
            .unwrap();
        storage
            .append_message(&case.id, "Where does it hurt?", Sender::Ai)
            .await
            .unwrap();

        let messages = storage.get_messages(&case.id).await.unwrap();
        assert_eq!(messages.len(), 1);

        let listed = storage.list_cases(Some("student-1")).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(storage.delete_case(&case.id).await.unwrap());
        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
