//! HashiCorp Vault credential store.
//!
//! Credentials are written to Vault's KV v2 secrets engine, one secret per
//! credential at `<path_prefix>/<domain>/<id>`, with the fields `id`, `scope`,
//! `description`, `username` and `password`. The global domain is stored
//! under `_`.
//!
//! # Example
//!
//! ```rust,ignore
//! use smtp_credentials::config::VaultConfig;
//! use smtp_credentials::secrets::VaultCredentialsStore;
//!
//! let store = VaultCredentialsStore::new(VaultConfig {
//!     address: "https://vault.example.com".to_string(),
//!     token: Some("vault-token".to_string()),
//!     ..Default::default()
//! })
//! .await?;
//! ```
//!
//! # Security
//!
//! - Tokens and passwords are never logged
//! - The password is the already-encrypted legacy value; Vault encrypts it again at rest

use async_trait::async_trait;
use std::collections::HashMap;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

use super::client::{CredentialLookup, CredentialsProvider, CredentialsStore};
use super::error::{Result, StoreError};
use crate::config::VaultConfig;
use crate::domain::{
    CredentialDomain, CredentialsId, CredentialsScope, EncryptedSecret, StoredCredential,
};

/// Credential store backed by Vault KV v2.
pub struct VaultCredentialsStore {
    client: VaultClient,
    address: String,
    mount_path: String,
    path_prefix: String,
}

impl std::fmt::Debug for VaultCredentialsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCredentialsStore")
            .field("address", &self.address)
            .field("mount_path", &self.mount_path)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

impl VaultCredentialsStore {
    /// Connect to Vault.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ConfigError`] if the configuration is invalid
    /// - [`StoreError::Unavailable`] if the client cannot be built or Vault
    ///   fails its health check
    pub async fn new(config: VaultConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(StoreError::config_error("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(namespace) = config.namespace.clone() {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder.build().map_err(|e| {
            StoreError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            StoreError::unavailable(format!("Failed to create Vault client: {}", e))
        })?;

        let store = Self {
            client,
            address: config.address,
            mount_path: config.mount_path,
            path_prefix: config.path_prefix.trim_matches('/').to_string(),
        };
        store.health_check().await?;
        Ok(store)
    }

    fn domain_path(&self, domain: &CredentialDomain) -> String {
        format!("{}/{}", self.path_prefix, domain.key())
    }

    fn credential_path(&self, domain: &CredentialDomain, id: &CredentialsId) -> String {
        format!("{}/{}", self.domain_path(domain), id)
    }

    async fn list_keys(&self, path: &str) -> Result<Vec<String>> {
        match kv2::list(&self.client, &self.mount_path, path).await {
            Ok(keys) => Ok(keys),
            // Vault answers 404 for an empty folder.
            Err(vaultrs::error::ClientError::APIError { code: 404, .. }) => Ok(Vec::new()),
            Err(e) => {
                tracing::error!(error = %e, path = %path, "Failed to list credentials in Vault");
                Err(StoreError::backend_error(format!("Failed to list '{}': {}", path, e)))
            }
        }
    }

    /// Decode a credential found while listing; one that cannot be decoded
    /// is skipped like one that cannot be read.
    fn decode_listed(id: &str, path: &str, data: HashMap<String, String>) -> Option<StoredCredential> {
        match Self::decode(id, data) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Skipping undecodable credential in Vault");
                None
            }
        }
    }

    fn decode(id: &str, mut data: HashMap<String, String>) -> Result<StoredCredential> {
        let field = |data: &mut HashMap<String, String>, name: &str| {
            data.remove(name).ok_or_else(|| {
                StoreError::backend_error(format!("Credential '{}' has no '{}' field", id, name))
            })
        };

        let scope: CredentialsScope =
            field(&mut data, "scope")?.parse().map_err(StoreError::backend_error)?;
        Ok(StoredCredential {
            id: CredentialsId::from_string(field(&mut data, "id")?),
            scope,
            description: data.remove("description").unwrap_or_default(),
            username: field(&mut data, "username")?,
            encrypted_secret: EncryptedSecret::new(field(&mut data, "password")?),
        })
    }
}

#[async_trait]
impl CredentialsStore for VaultCredentialsStore {
    fn name(&self) -> &str {
        "vault"
    }

    async fn health_check(&self) -> Result<()> {
        match vaultrs::sys::health(&self.client).await {
            Ok(_) => {
                tracing::debug!(address = %self.address, "Vault is healthy");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, address = %self.address, "Vault health check failed");
                Err(StoreError::unavailable(format!("Vault health check failed: {}", e)))
            }
        }
    }

    async fn add_credentials(
        &self,
        domain: &CredentialDomain,
        credential: StoredCredential,
    ) -> Result<()> {
        let path = self.credential_path(domain, &credential.id);

        if kv2::read_metadata(&self.client, &self.mount_path, &path).await.is_ok() {
            return Err(StoreError::already_exists(credential.id.as_str()));
        }

        let mut data = HashMap::new();
        data.insert("id".to_string(), credential.id.to_string());
        data.insert("scope".to_string(), credential.scope.to_string());
        data.insert("description".to_string(), credential.description.clone());
        data.insert("username".to_string(), credential.username.clone());
        data.insert(
            "password".to_string(),
            credential.encrypted_secret.encrypted_value().to_string(),
        );

        kv2::set(&self.client, &self.mount_path, &path, &data).await.map_err(|e| {
            tracing::error!(error = %e, credentials_id = %credential.id, "Failed to write credential to Vault");
            StoreError::write_failed(credential.id.as_str(), e.to_string())
        })?;

        tracing::info!(
            credentials_id = %credential.id,
            mount_path = %self.mount_path,
            domain = %domain,
            "Stored credential in Vault"
        );
        Ok(())
    }
}

#[async_trait]
impl CredentialsProvider for VaultCredentialsStore {
    async fn lookup_credentials(&self, lookup: &CredentialLookup) -> Result<Vec<StoredCredential>> {
        let mut found = Vec::new();

        for domain_key in self.list_keys(&self.path_prefix).await? {
            let domain = CredentialDomain::from_key(domain_key.trim_end_matches('/'));
            let domain_path = self.domain_path(&domain);

            for id in self.list_keys(&domain_path).await? {
                let path = format!("{}/{}", domain_path, id);
                let data: HashMap<String, String> =
                    match kv2::read(&self.client, &self.mount_path, &path).await {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::warn!(error = %e, path = %path, "Failed to read credential from Vault");
                            continue;
                        }
                    };

                let Some(credential) = Self::decode_listed(&id, &path, data) else {
                    continue;
                };
                if lookup.matches(&domain, &credential) {
                    found.push(credential);
                }
            }
        }

        Ok(found)
    }
}
