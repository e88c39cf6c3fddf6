//! Core credential store traits and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{Result, StoreError};
use crate::domain::{CredentialDomain, CredentialKind, CredentialsId, DomainRequirement, StoredCredential};

/// Who is asking for credentials, as forwarded by the selector.
///
/// Stores in this crate do not authorize lookups; the context is carried so
/// a host-provided provider can.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Configuration item the lookup is made for; `None` for the global configuration
    pub context: Option<String>,
    /// Principal performing the lookup; `None` for the system itself
    pub principal: Option<String>,
}

impl CallerContext {
    /// The system acting on the global configuration
    pub fn system() -> Self {
        Self::default()
    }
}

/// Parameters of a credential lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialLookup {
    pub kind: CredentialKind,
    pub caller: CallerContext,
    pub domain_requirements: Vec<DomainRequirement>,
}

impl CredentialLookup {
    /// Every username/password credential visible to the system
    pub fn username_password() -> Self {
        Self::default()
    }

    pub fn with_caller(mut self, caller: CallerContext) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_requirement(mut self, requirement: DomainRequirement) -> Self {
        self.domain_requirements.push(requirement);
        self
    }

    /// Whether a credential held in `domain` satisfies this lookup
    pub fn matches(&self, domain: &CredentialDomain, credential: &StoredCredential) -> bool {
        credential.kind() == self.kind && domain.matches(&self.domain_requirements)
    }
}

/// Write side of a credential store.
///
/// # Contract
///
/// - `add_credentials` either persists the whole credential or fails; a
///   failed call leaves nothing reachable under the credential's id
/// - each call with a distinct id creates a distinct entry; there is no
///   upsert, and an existing id is rejected
/// - implementations MUST NOT log secret values
#[async_trait]
pub trait CredentialsStore: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &str;

    /// Check that the store can be reached.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unavailable`] if the store cannot be located or reached
    async fn health_check(&self) -> Result<()>;

    /// Persist a new credential in `domain`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if the id is taken
    /// - [`StoreError::WriteFailed`] or [`StoreError::BackendError`] if the write fails
    async fn add_credentials(
        &self,
        domain: &CredentialDomain,
        credential: StoredCredential,
    ) -> Result<()>;
}

/// Read side of a credential store.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// All credentials matching the lookup, in no particular order
    async fn lookup_credentials(&self, lookup: &CredentialLookup) -> Result<Vec<StoredCredential>>;

    /// Find one credential by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no matching credential carries `id`
    async fn find_credential(
        &self,
        lookup: &CredentialLookup,
        id: &CredentialsId,
    ) -> Result<StoredCredential> {
        self.lookup_credentials(lookup)
            .await?
            .into_iter()
            .find(|credential| &credential.id == id)
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }
}
