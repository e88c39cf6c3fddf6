//! Common test utilities for all integration tests.
//!
//! Provides a credential store whose writes fail on a script, and helpers for
//! SMTP authentication record files.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use async_trait::async_trait;
use smtp_credentials::domain::{
    CredentialDomain, CredentialsId, EncryptedSecret, SmtpAuthenticationDocument, StoredCredential,
};
use smtp_credentials::secrets::{
    CredentialLookup, CredentialsProvider, CredentialsStore, InMemoryCredentialsStore, StoreError,
};
use smtp_credentials::storage::RecordFile;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub const USERNAME: &str = "smtp-user";
pub const PASSWORD: &str = "s3cret";

/// Pre-migration record layout used across tests
pub fn legacy_document() -> SmtpAuthenticationDocument {
    SmtpAuthenticationDocument {
        username: Some(USERNAME.to_string()),
        password: Some(EncryptedSecret::new(PASSWORD)),
        credentials_id: None,
    }
}

/// Write `document` to `smtp-auth.json` under `dir`
pub async fn write_record(dir: &Path, document: &SmtpAuthenticationDocument) -> PathBuf {
    let path = dir.join("smtp-auth.json");
    RecordFile::new(&path).write(document).await.unwrap();
    path
}

/// Credential store that fails the first `failures` writes, then accepts.
///
/// Accepted credentials land in an in-memory store. Every write attempt is
/// counted and its id recorded. When a record path is watched, the file's
/// content is captured at each attempt.
pub struct ScriptedStore {
    failures: u32,
    healthy: bool,
    calls: AtomicU32,
    attempted_ids: Mutex<Vec<CredentialsId>>,
    watched: Option<PathBuf>,
    snapshots: Mutex<Vec<Vec<u8>>>,
    accepted: InMemoryCredentialsStore,
}

impl ScriptedStore {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            healthy: true,
            calls: AtomicU32::new(0),
            attempted_ids: Mutex::new(Vec::new()),
            watched: None,
            snapshots: Mutex::new(Vec::new()),
            accepted: InMemoryCredentialsStore::new(),
        }
    }

    pub fn reliable() -> Self {
        Self::failing(0)
    }

    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    pub fn unhealthy() -> Self {
        Self { healthy: false, ..Self::reliable() }
    }

    pub fn watching(mut self, record: impl Into<PathBuf>) -> Self {
        self.watched = Some(record.into());
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn attempted_ids(&self) -> Vec<CredentialsId> {
        self.attempted_ids.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<Vec<u8>> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn accepted(&self) -> &InMemoryCredentialsStore {
        &self.accepted
    }
}

#[async_trait]
impl CredentialsStore for ScriptedStore {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.healthy {
            Ok(())
        } else {
            Err(StoreError::unavailable("store is sealed"))
        }
    }

    async fn add_credentials(
        &self,
        domain: &CredentialDomain,
        credential: StoredCredential,
    ) -> Result<(), StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempted_ids.lock().unwrap().push(credential.id.clone());

        if let Some(path) = &self.watched {
            let bytes = std::fs::read(path).unwrap();
            self.snapshots.lock().unwrap().push(bytes);
        }

        if call <= self.failures {
            return Err(StoreError::write_failed(credential.id.as_str(), "connection reset"));
        }
        self.accepted.add_credentials(domain, credential).await
    }
}

#[async_trait]
impl CredentialsProvider for ScriptedStore {
    async fn lookup_credentials(
        &self,
        lookup: &CredentialLookup,
    ) -> Result<Vec<StoredCredential>, StoreError> {
        self.accepted.lookup_credentials(lookup).await
    }
}
