//! Post-load resolution of SMTP authentication records
//!
//! Every record loaded from disk passes through
//! [`SmtpAuthenticationLoader::resolve`] before it is handed out. A record
//! that still carries inline credentials is migrated there; if that migration
//! fails, no record is returned.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, Instrument};

use super::migration::{MigrationExecutor, MigrationOutcome};
use crate::config::MigrationConfig;
use crate::domain::{SmtpAuthentication, SmtpAuthenticationDocument};
use crate::errors::Result;
use crate::secrets::CredentialsStore;
use crate::storage::RecordFile;

/// A record that finished loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRecord {
    pub record: SmtpAuthentication,
    pub outcome: MigrationOutcome,
    /// Whether the migrated layout was written back to disk
    pub persisted: bool,
}

/// Loads SMTP authentication records and completes pending migrations.
#[derive(Debug, Clone)]
pub struct SmtpAuthenticationLoader {
    executor: MigrationExecutor,
    persist_migrated: bool,
}

impl SmtpAuthenticationLoader {
    pub fn new(executor: MigrationExecutor) -> Self {
        Self { executor, persist_migrated: true }
    }

    /// Loader writing to `store`, with retry budget, subject and persistence
    /// taken from configuration
    pub fn from_config(store: Arc<dyn CredentialsStore>, config: &MigrationConfig) -> Self {
        Self::new(MigrationExecutor::new(store).configured(config))
            .persist_migrated(config.persist_migrated)
    }

    pub fn persist_migrated(mut self, persist: bool) -> Self {
        self.persist_migrated = persist;
        self
    }

    pub fn executor(&self) -> &MigrationExecutor {
        &self.executor
    }

    /// Build a record from its persisted layout and migrate it if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`](crate::errors::Error::Validation) if the document holds no usable credentials
    /// - [`Error::Migration`](crate::errors::Error::Migration) if a pending migration failed; no record exists
    pub async fn resolve(
        &self,
        document: SmtpAuthenticationDocument,
    ) -> Result<(SmtpAuthentication, MigrationOutcome)> {
        let mut record = SmtpAuthentication::from_document(document)?;
        let outcome = self.executor.migrate(&mut record).await?;
        Ok((record, outcome))
    }

    /// Read the record at `path`, complete any pending migration, and write
    /// the migrated layout back when persistence is enabled.
    ///
    /// The file is rewritten only after the migration succeeded, in a single
    /// atomic replace.
    pub async fn load(&self, path: &Path) -> Result<LoadedRecord> {
        let span = crate::migration_span!("load_record", path = %path.display());

        async {
            let file = RecordFile::new(path);
            let document = file.read().await?;

            let (record, outcome) = self.resolve(document).await.inspect_err(|e| {
                if e.is_fatal_migration() {
                    error!(error = %e, "SMTP authentication record could not be loaded");
                }
            })?;

            let persisted = match &outcome {
                MigrationOutcome::Migrated { credentials_id, .. } if self.persist_migrated => {
                    file.write(&record.to_document()).await.map_err(|e| {
                        error!(
                            credentials_id = %credentials_id,
                            error = %e,
                            "Credential was stored but the migrated record could not be written"
                        );
                        e
                    })?;
                    info!(credentials_id = %credentials_id, "Persisted migrated SMTP authentication record");
                    true
                }
                MigrationOutcome::Migrated { .. } => {
                    debug!("Migrated SMTP authentication record kept in memory only");
                    false
                }
                MigrationOutcome::AlreadyMigrated => false,
            };

            Ok(LoadedRecord { record, outcome, persisted })
        }
        .instrument(span)
        .await
    }

    /// Read the record at `path` without migrating or writing anything.
    pub async fn inspect(&self, path: &Path) -> Result<SmtpAuthentication> {
        let document = RecordFile::new(path).read().await?;
        SmtpAuthentication::from_document(document)
    }
}

/// Loader for a credential store that could not be opened.
///
/// Records that are already migrated still load; pending migrations fail
/// with a store-unavailable error.
pub fn unavailable_loader(
    store: impl Into<String>,
    reason: impl Into<String>,
    config: &MigrationConfig,
) -> SmtpAuthenticationLoader {
    SmtpAuthenticationLoader::new(MigrationExecutor::unavailable(store, reason).configured(config))
        .persist_migrated(config.persist_migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CredentialsId, EncryptedSecret};
    use crate::errors::Error;
    use crate::secrets::InMemoryCredentialsStore;

    fn legacy_document() -> SmtpAuthenticationDocument {
        SmtpAuthenticationDocument {
            username: Some("smtp-user".to_string()),
            password: Some(EncryptedSecret::new("s3cret")),
            credentials_id: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_migrates_legacy_document() {
        let store = Arc::new(InMemoryCredentialsStore::new());
        let loader = SmtpAuthenticationLoader::new(MigrationExecutor::new(store.clone()));

        let (record, outcome) = loader.resolve(legacy_document()).await.unwrap();

        assert!(!record.requires_migration());
        assert_eq!(record.credentials_id(), outcome.credentials_id());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_document() {
        let loader =
            SmtpAuthenticationLoader::new(MigrationExecutor::new(Arc::new(InMemoryCredentialsStore::new())));
        let err = loader.resolve(SmtpAuthenticationDocument::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_load_without_persistence_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smtp-auth.json");
        RecordFile::new(&path).write(&legacy_document()).await.unwrap();

        let loader = SmtpAuthenticationLoader::new(MigrationExecutor::new(Arc::new(
            InMemoryCredentialsStore::new(),
        )))
        .persist_migrated(false);
        let loaded = loader.load(&path).await.unwrap();

        assert!(!loaded.persisted);
        assert!(loaded.record.credentials_id().is_some());
        assert_eq!(RecordFile::new(&path).read().await.unwrap(), legacy_document());
    }

    #[tokio::test]
    async fn test_inspect_does_not_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smtp-auth.json");
        RecordFile::new(&path).write(&legacy_document()).await.unwrap();

        let store = Arc::new(InMemoryCredentialsStore::new());
        let loader = SmtpAuthenticationLoader::new(MigrationExecutor::new(store.clone()));
        let record = loader.inspect(&path).await.unwrap();

        assert!(record.requires_migration());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_loader_still_loads_migrated_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smtp-auth.json");
        let id = CredentialsId::generate();
        RecordFile::new(&path)
            .write(&SmtpAuthenticationDocument { credentials_id: Some(id.clone()), ..Default::default() })
            .await
            .unwrap();

        let loader = unavailable_loader("vault", "sealed", &MigrationConfig::default());
        let loaded = loader.load(&path).await.unwrap();

        assert_eq!(loaded.outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(loaded.record.credentials_id(), Some(&id));
    }
}
