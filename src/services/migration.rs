//! Migration of inline SMTP credentials into the credential store
//!
//! [`MigrationExecutor::migrate`] moves a record's inline username and
//! encrypted password into a new [`StoredCredential`] and swaps the inline
//! fields for the new credential's id.
//!
//! ## Retry budget
//!
//! Each attempt draws a fresh [`CredentialsId`] and submits one write. A
//! failed attempt abandons its id without a compensating delete: store writes
//! are all-or-nothing by the [`CredentialsStore`] contract. Attempts follow
//! each other immediately, without backoff, up to the configured budget
//! (10 by default). When the budget is spent the record is left untouched so a
//! later load can try again.
//!
//! ## Failure taxonomy
//!
//! - [`MigrationError::StoreUnavailable`]: the store could not be opened at
//!   all. Fatal, never retried. A store that was opened but fails a write is
//!   retried like any other write failure.
//! - [`MigrationError::TransientStoreFailure`]: one write failed. Handled
//!   inside the retry loop and only surfaced as the source of
//!   [`MigrationError::RetriesExhausted`].
//! - [`MigrationError::RetriesExhausted`]: every attempt failed. Fatal.
//! - [`MigrationError::IncompleteLegacy`]: the record has a username but no
//!   password. A password without a username migrates with an empty
//!   username.

use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{MigrationConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_SUBJECT};
use crate::domain::{CredentialDomain, CredentialsId, EncryptedSecret, SmtpAuthentication, StoredCredential};
use crate::secrets::{CredentialsStore, StoreError};

/// Fatal and per-attempt migration errors
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The credential store cannot be located or reached.
    #[error("Could not migrate the {subject} authentication details to a credential, as the credential store '{store}' is unavailable: {reason}")]
    StoreUnavailable { store: String, subject: String, reason: String },

    /// One store write failed; the retry loop moves on to the next attempt.
    #[error("Attempt {attempt} to store the migrated credential failed: {source}")]
    TransientStoreFailure {
        attempt: u32,
        #[source]
        source: StoreError,
    },

    /// Every attempt in the retry budget failed.
    #[error("All {attempts} attempts to migrate the {subject} authentication details failed")]
    RetriesExhausted {
        attempts: u32,
        subject: String,
        #[source]
        last_failure: Option<Box<MigrationError>>,
    },

    /// The record has an inline username but no password.
    #[error("Could not migrate the {subject} authentication details: the inline {missing} is missing")]
    IncompleteLegacy { subject: String, missing: &'static str },
}

impl MigrationError {
    /// Whether the owning record must not be constructed
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TransientStoreFailure { .. })
    }
}

/// Result of running the executor on a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The record already referenced a stored credential; nothing was written.
    AlreadyMigrated,
    /// A credential was stored and the record now references it.
    Migrated { credentials_id: CredentialsId, attempts: u32 },
}

impl MigrationOutcome {
    pub fn credentials_id(&self) -> Option<&CredentialsId> {
        match self {
            Self::Migrated { credentials_id, .. } => Some(credentials_id),
            Self::AlreadyMigrated => None,
        }
    }
}

#[derive(Clone)]
enum StoreSlot {
    Ready(Arc<dyn CredentialsStore>),
    Unavailable { name: String, reason: String },
}

/// Moves inline SMTP credentials into a credential store.
#[derive(Clone)]
pub struct MigrationExecutor {
    store: StoreSlot,
    max_attempts: NonZeroU32,
    subject: String,
    domain: CredentialDomain,
}

impl std::fmt::Debug for MigrationExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = match &self.store {
            StoreSlot::Ready(store) => store.name().to_string(),
            StoreSlot::Unavailable { name, .. } => format!("{} (unavailable)", name),
        };
        f.debug_struct("MigrationExecutor")
            .field("store", &store)
            .field("max_attempts", &self.max_attempts)
            .field("subject", &self.subject)
            .finish()
    }
}

impl MigrationExecutor {
    /// Executor writing to `store` with the default budget and subject
    pub fn new(store: Arc<dyn CredentialsStore>) -> Self {
        Self::with_slot(StoreSlot::Ready(store))
    }

    /// Executor for a store that could not be opened.
    ///
    /// Already-migrated records still load; any record that needs migrating
    /// fails with [`MigrationError::StoreUnavailable`].
    pub fn unavailable(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_slot(StoreSlot::Unavailable { name: store.into(), reason: reason.into() })
    }

    fn with_slot(store: StoreSlot) -> Self {
        Self {
            store,
            max_attempts: NonZeroU32::new(DEFAULT_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN),
            subject: DEFAULT_SUBJECT.to_string(),
            domain: CredentialDomain::global(),
        }
    }

    /// Apply the retry budget and subject from configuration
    pub fn configured(self, config: &MigrationConfig) -> Self {
        self.with_max_attempts(config.max_attempts).with_subject(config.subject.clone())
    }

    /// Set the retry budget. Zero is raised to one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Provenance label written on every migrated credential
    pub fn description(&self) -> String {
        format!("{} authentication credentials (migrated)", self.subject)
    }

    /// Migrate `record` if it still carries inline credentials.
    ///
    /// On success the record references the new credential and no longer
    /// holds the inline fields. On error the record is unchanged.
    #[instrument(skip_all, fields(subject = %self.subject))]
    pub async fn migrate(
        &self,
        record: &mut SmtpAuthentication,
    ) -> Result<MigrationOutcome, MigrationError> {
        let Some(legacy) = record.legacy_credentials() else {
            debug!("SMTP authentication already references a stored credential");
            return Ok(MigrationOutcome::AlreadyMigrated);
        };

        info!("Migrating the {} authentication details to a credential", self.subject);

        let password = legacy.password().ok_or_else(|| self.incomplete("password"))?.clone();
        let username = legacy.username().unwrap_or_default().to_string();

        let store = self.ready_store()?;
        let max_attempts = self.max_attempts.get();
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "Attempt {}/{}", attempt, max_attempts);

            match self.attempt(store.as_ref(), attempt, &username, &password).await {
                Ok(credentials_id) => {
                    record.complete_migration(credentials_id.clone());
                    info!(
                        credentials_id = %credentials_id,
                        attempts = attempt,
                        "Migrated the {} authentication details to a credential",
                        self.subject
                    );
                    return Ok(MigrationOutcome::Migrated { credentials_id, attempts: attempt });
                }
                Err(failure) => {
                    warn!(attempt, max_attempts, error = %failure, "Credential store write failed");
                    last_failure = Some(Box::new(failure));
                }
            }
        }

        error!(
            attempts = max_attempts,
            store = %store.name(),
            "All attempts to migrate the {} authentication details failed",
            self.subject
        );
        Err(MigrationError::RetriesExhausted {
            attempts: max_attempts,
            subject: self.subject.clone(),
            last_failure,
        })
    }

    /// One write under a freshly drawn id
    async fn attempt(
        &self,
        store: &dyn CredentialsStore,
        attempt: u32,
        username: &str,
        password: &EncryptedSecret,
    ) -> Result<CredentialsId, MigrationError> {
        let credentials_id = CredentialsId::generate();
        let credential = StoredCredential::username_password(
            credentials_id.clone(),
            self.description(),
            username,
            password.clone(),
        );

        store
            .add_credentials(&self.domain, credential)
            .await
            .map(|()| credentials_id)
            .map_err(|source| MigrationError::TransientStoreFailure { attempt, source })
    }

    fn ready_store(&self) -> Result<Arc<dyn CredentialsStore>, MigrationError> {
        match &self.store {
            StoreSlot::Ready(store) => Ok(store.clone()),
            StoreSlot::Unavailable { name, reason } => {
                error!(store = %name, reason = %reason, "Credential store is unavailable");
                Err(MigrationError::StoreUnavailable {
                    store: name.clone(),
                    subject: self.subject.clone(),
                    reason: reason.clone(),
                })
            }
        }
    }

    fn incomplete(&self, missing: &'static str) -> MigrationError {
        error!(missing, "Inline SMTP credentials have no password");
        MigrationError::IncompleteLegacy { subject: self.subject.clone(), missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SmtpAuthenticationDocument;
    use crate::secrets::InMemoryCredentialsStore;

    fn legacy_record() -> SmtpAuthentication {
        SmtpAuthentication::from_document(SmtpAuthenticationDocument {
            username: Some("smtp-user".to_string()),
            password: Some(EncryptedSecret::new("s3cret")),
            credentials_id: None,
        })
        .unwrap()
    }

    #[test]
    fn test_description() {
        let executor = MigrationExecutor::new(Arc::new(InMemoryCredentialsStore::new()));
        assert_eq!(executor.description(), "Mailer SMTP authentication credentials (migrated)");

        let executor = executor.with_subject("Relay");
        assert_eq!(executor.description(), "Relay authentication credentials (migrated)");
    }

    #[test]
    fn test_budget_defaults_and_clamps() {
        let executor = MigrationExecutor::new(Arc::new(InMemoryCredentialsStore::new()));
        assert_eq!(executor.max_attempts(), 10);
        assert_eq!(executor.clone().with_max_attempts(0).max_attempts(), 1);
        assert_eq!(executor.with_max_attempts(3).max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_migrates_into_memory_store() {
        let store = Arc::new(InMemoryCredentialsStore::new());
        let executor = MigrationExecutor::new(store.clone());
        let mut record = legacy_record();

        let outcome = executor.migrate(&mut record).await.unwrap();

        let id = outcome.credentials_id().cloned().unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { credentials_id: id.clone(), attempts: 1 });
        assert_eq!(record.credentials_id(), Some(&id));
        assert!(record.legacy_username().is_none());

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.username, "smtp-user");
        assert_eq!(stored.encrypted_secret, EncryptedSecret::new("s3cret"));
        assert_eq!(stored.description, "Mailer SMTP authentication credentials (migrated)");
    }

    #[tokio::test]
    async fn test_already_migrated_is_untouched() {
        let store = Arc::new(InMemoryCredentialsStore::new());
        let executor = MigrationExecutor::new(store.clone());
        let mut record = SmtpAuthentication::new(CredentialsId::from("existing"));
        let before = record.clone();

        let outcome = executor.migrate(&mut record).await.unwrap();

        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(record, before);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let executor = MigrationExecutor::unavailable("vault", "connection refused");
        let mut record = legacy_record();

        let err = executor.migrate(&mut record).await.unwrap_err();

        assert!(matches!(err, MigrationError::StoreUnavailable { .. }));
        assert!(err.is_fatal());
        assert_eq!(record, legacy_record());
    }

    #[tokio::test]
    async fn test_unavailable_store_does_not_block_migrated_records() {
        let executor = MigrationExecutor::unavailable("vault", "connection refused");
        let mut record = SmtpAuthentication::new(CredentialsId::from("existing"));
        assert_eq!(executor.migrate(&mut record).await.unwrap(), MigrationOutcome::AlreadyMigrated);
    }

    #[tokio::test]
    async fn test_incomplete_legacy_pair() {
        let store = Arc::new(InMemoryCredentialsStore::new());
        let executor = MigrationExecutor::new(store.clone());
        let mut record = SmtpAuthentication::from_document(SmtpAuthenticationDocument {
            username: Some("smtp-user".to_string()),
            ..Default::default()
        })
        .unwrap();
        let before = record.clone();

        let err = executor.migrate(&mut record).await.unwrap_err();

        assert!(matches!(err, MigrationError::IncompleteLegacy { missing: "password", .. }));
        assert_eq!(record, before);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_password_without_username_migrates_with_empty_username() {
        let store = Arc::new(InMemoryCredentialsStore::new());
        let executor = MigrationExecutor::new(store.clone());
        let mut record = SmtpAuthentication::from_document(SmtpAuthenticationDocument {
            password: Some(EncryptedSecret::new("s3cret")),
            ..Default::default()
        })
        .unwrap();

        let outcome = executor.migrate(&mut record).await.unwrap();

        let stored = store.get(outcome.credentials_id().unwrap()).unwrap();
        assert_eq!(stored.username, "");
        assert_eq!(stored.encrypted_secret, EncryptedSecret::new("s3cret"));
        assert!(!record.requires_migration());
    }

    #[test]
    fn test_transient_failure_is_not_fatal() {
        let err = MigrationError::TransientStoreFailure {
            attempt: 2,
            source: StoreError::backend_error("timeout"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("Attempt 2"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_secret_is_never_logged() {
        let executor = MigrationExecutor::new(Arc::new(InMemoryCredentialsStore::new()));
        let mut record = legacy_record();

        executor.migrate(&mut record).await.unwrap();

        assert!(logs_contain("Attempt 1/10"));
        assert!(logs_contain("Migrated the Mailer SMTP authentication details"));
        assert!(!logs_contain("s3cret"));
    }
}
