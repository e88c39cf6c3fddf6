//! Credential store abstraction.
//!
//! A credential store is the system of record for username/password
//! credentials. Migrations write to it through [`CredentialsStore`]; the
//! selector interface reads from it through [`CredentialsProvider`].
//!
//! # Supported Backends
//!
//! - **File**: JSON document on local disk, rewritten atomically
//! - **HashiCorp Vault**: KV v2 engine (`vault` feature)
//! - **Memory**: process-local, for tests and dry runs
//!
//! # Example
//!
//! ```rust,ignore
//! use smtp_credentials::config::StoreConfig;
//! use smtp_credentials::secrets::open_store;
//!
//! let handle = open_store(&StoreConfig::default()).await?;
//! handle.store.health_check().await?;
//! ```

pub mod client;
pub mod error;
pub mod file;
pub mod memory;
pub mod selector;
#[cfg(feature = "vault")]
pub mod vault;

use std::sync::Arc;

pub use client::{CallerContext, CredentialLookup, CredentialsProvider, CredentialsStore};
pub use error::{Result, StoreError};
pub use file::FileCredentialsStore;
pub use memory::InMemoryCredentialsStore;
pub use selector::{CredentialOption, CredentialSelector, ProviderSelector};
#[cfg(feature = "vault")]
pub use vault::VaultCredentialsStore;

use crate::config::{StoreBackend, StoreConfig};

/// Both sides of one opened credential store.
#[derive(Clone)]
pub struct StoreHandle {
    pub store: Arc<dyn CredentialsStore>,
    pub provider: Arc<dyn CredentialsProvider>,
}

impl StoreHandle {
    pub fn new<S>(backend: Arc<S>) -> Self
    where
        S: CredentialsStore + CredentialsProvider + 'static,
    {
        Self { store: backend.clone(), provider: backend }
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").field("store", &self.store.name()).finish()
    }
}

/// Open the credential store named by the configuration.
///
/// # Errors
///
/// - [`StoreError::Unavailable`] if the backend cannot be constructed or
///   reached, including when it was compiled out
/// - [`StoreError::ConfigError`] if its configuration is invalid
pub async fn open_store(config: &StoreConfig) -> Result<StoreHandle> {
    let handle = match config.backend {
        StoreBackend::Memory => StoreHandle::new(Arc::new(InMemoryCredentialsStore::new())),
        StoreBackend::File => {
            let store = Arc::new(FileCredentialsStore::new(config.file_path.clone()));
            store.health_check().await?;
            StoreHandle::new(store)
        }
        #[cfg(feature = "vault")]
        StoreBackend::Vault => {
            StoreHandle::new(Arc::new(VaultCredentialsStore::new(config.vault.clone()).await?))
        }
        #[cfg(not(feature = "vault"))]
        StoreBackend::Vault => {
            return Err(StoreError::unavailable(
                "Vault credential store requested but this build has no vault support",
            ))
        }
    };

    tracing::info!(backend = %config.backend, "Opened credential store");
    Ok(handle)
}
