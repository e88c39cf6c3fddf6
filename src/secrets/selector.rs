//! Credential selection for configuration screens.
//!
//! Choosing which credential a mailer configuration uses, and deciding who
//! may see which credentials, belongs to the host application. This module
//! only defines the interface the host consumes, plus an adapter that lists
//! everything a [`CredentialsProvider`] returns. Migrated credentials show up
//! here like any other.

use async_trait::async_trait;
use std::sync::Arc;

use super::client::{CallerContext, CredentialLookup, CredentialsProvider};
use super::error::Result;
use crate::domain::{CredentialsId, StoredCredential};

/// One entry of a credential picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialOption {
    pub id: CredentialsId,
    pub label: String,
}

/// Interface through which users pick the credential a record references.
#[async_trait]
pub trait CredentialSelector: Send + Sync {
    /// Credentials the caller may choose from, in display order
    async fn list_available(&self, caller: &CallerContext) -> Result<Vec<CredentialOption>>;

    /// The credential behind `id`.
    ///
    /// # Errors
    ///
    /// - [`super::StoreError::NotFound`] if `id` does not resolve for this caller
    async fn resolve(&self, caller: &CallerContext, id: &CredentialsId) -> Result<StoredCredential>;
}

/// [`CredentialSelector`] over a provider, without any authorization.
///
/// Lists username/password credentials ordered by label, then id.
pub struct ProviderSelector {
    provider: Arc<dyn CredentialsProvider>,
}

impl ProviderSelector {
    pub fn new(provider: Arc<dyn CredentialsProvider>) -> Self {
        Self { provider }
    }

    fn lookup(caller: &CallerContext) -> CredentialLookup {
        CredentialLookup::username_password().with_caller(caller.clone())
    }
}

#[async_trait]
impl CredentialSelector for ProviderSelector {
    async fn list_available(&self, caller: &CallerContext) -> Result<Vec<CredentialOption>> {
        let mut options: Vec<CredentialOption> = self
            .provider
            .lookup_credentials(&Self::lookup(caller))
            .await?
            .into_iter()
            .map(|credential| CredentialOption {
                label: credential.display_label(),
                id: credential.id.clone(),
            })
            .collect();

        options.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        Ok(options)
    }

    async fn resolve(&self, caller: &CallerContext, id: &CredentialsId) -> Result<StoredCredential> {
        self.provider.find_credential(&Self::lookup(caller), id).await
    }
}
