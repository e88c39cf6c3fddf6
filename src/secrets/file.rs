//! File-backed credential store.
//!
//! Credentials are kept in a single JSON document grouped by domain:
//!
//! ```json
//! {
//!   "version": 1,
//!   "updatedAt": "2026-10-15T09:00:00Z",
//!   "domains": {
//!     "_": [
//!       { "id": "…", "scope": "global", "description": "…", "username": "…", "password": "{…}" }
//!     ]
//!   }
//! }
//! ```
//!
//! Every write rewrites the whole document through a uniquely named temporary
//! file and a rename, so a failed write leaves the previous document in place
//! and never exposes a partially written credential. Writers hold an exclusive
//! lock on `<name>.lock` for the whole read-modify-replace, so store instances
//! in different tasks or processes never lose each other's credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use fd_lock::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::{CredentialLookup, CredentialsProvider, CredentialsStore};
use super::error::{Result, StoreError};
use crate::domain::{CredentialDomain, StoredCredential};
use crate::storage::write_atomically;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsDocument {
    #[serde(default)]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    domains: BTreeMap<String, Vec<StoredCredential>>,
}

impl CredentialsDocument {
    fn contains(&self, credential: &StoredCredential) -> bool {
        self.domains.values().flatten().any(|existing| existing.id == credential.id)
    }
}

/// Credential store persisted as a JSON file.
#[derive(Debug)]
pub struct FileCredentialsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialsStore {
    /// Open a store at `path`. The file is created on first write; its
    /// directory must already exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling lock file coordinating writers across processes: `<name>.lock`
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsString::from).unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    async fn read_document(&self) -> Result<CredentialsDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CredentialsDocument::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CredentialsStore for FileCredentialsStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn health_check(&self) -> Result<()> {
        let directory = self.directory();
        match tokio::fs::metadata(directory).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::unavailable(format!(
                    "{} is not a directory",
                    directory.display()
                )))
            }
            Err(e) => {
                return Err(StoreError::unavailable(format!(
                    "credential store directory {} is not accessible: {}",
                    directory.display(),
                    e
                )))
            }
        }

        self.read_document().await.map(|_| ()).map_err(|e| {
            StoreError::unavailable(format!(
                "credential store {} cannot be read: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn add_credentials(
        &self,
        domain: &CredentialDomain,
        credential: StoredCredential,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let id = credential.id.clone();
        let path = self.path.clone();
        let lock_path = self.lock_path();
        let domain_key = domain.key().to_string();

        tokio::task::spawn_blocking(move || {
            insert_locked(&path, &lock_path, &domain_key, credential)
        })
        .await
        .map_err(|e| StoreError::write_failed(id.as_str(), e.to_string()))??;

        info!(
            credentials_id = %id,
            domain = %domain,
            path = %self.path.display(),
            "Stored credential in file store"
        );
        Ok(())
    }
}

/// Read-modify-replace of the document while holding the exclusive lock on
/// `lock_path`. Other processes using the same store file wait here.
fn insert_locked(
    path: &Path,
    lock_path: &Path,
    domain_key: &str,
    credential: StoredCredential,
) -> Result<()> {
    let id = credential.id.clone();
    let lock_failed = |e: std::io::Error| {
        StoreError::write_failed(
            id.as_str(),
            format!("cannot lock {}: {}", lock_path.display(), e),
        )
    };

    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(lock_failed)?;
    let mut lock = RwLock::new(lock_file);
    let _held = lock.write().map_err(lock_failed)?;

    let mut document = match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice::<CredentialsDocument>(&bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => CredentialsDocument::default(),
        Err(e) => return Err(e.into()),
    };
    if document.contains(&credential) {
        return Err(StoreError::already_exists(id.as_str()));
    }

    document.version = DOCUMENT_VERSION;
    document.updated_at = Some(Utc::now());
    document.domains.entry(domain_key.to_string()).or_default().push(credential);

    let bytes = serde_json::to_vec_pretty(&document)?;
    write_atomically(path, &bytes).map_err(|e| StoreError::write_failed(id.as_str(), e.to_string()))
}

#[async_trait]
impl CredentialsProvider for FileCredentialsStore {
    async fn lookup_credentials(&self, lookup: &CredentialLookup) -> Result<Vec<StoredCredential>> {
        let document = self.read_document().await?;
        let found: Vec<StoredCredential> = document
            .domains
            .iter()
            .flat_map(|(key, credentials)| {
                let domain = CredentialDomain::from_key(key);
                credentials
                    .iter()
                    .filter(move |credential| lookup.matches(&domain, credential))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        debug!(path = %self.path.display(), count = found.len(), "Looked up credentials in file store");
        Ok(found)
    }
}
