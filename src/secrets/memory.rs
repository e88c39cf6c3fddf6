//! In-memory credential store.
//!
//! Holds credentials for the lifetime of the process only. Used by tests and
//! by the `memory` store backend for dry runs against throwaway state.

use async_trait::async_trait;
use dashmap::DashMap;

use super::client::{CredentialLookup, CredentialsProvider, CredentialsStore};
use super::error::{Result, StoreError};
use crate::domain::{CredentialDomain, CredentialsId, StoredCredential};

/// Process-local credential store keyed by credential id.
#[derive(Debug, Default)]
pub struct InMemoryCredentialsStore {
    credentials: DashMap<CredentialsId, (CredentialDomain, StoredCredential)>,
}

impl InMemoryCredentialsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn get(&self, id: &CredentialsId) -> Option<StoredCredential> {
        self.credentials.get(id).map(|entry| entry.value().1.clone())
    }
}

#[async_trait]
impl CredentialsStore for InMemoryCredentialsStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn add_credentials(
        &self,
        domain: &CredentialDomain,
        credential: StoredCredential,
    ) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.credentials.entry(credential.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::already_exists(credential.id.as_str())),
            Entry::Vacant(slot) => {
                tracing::debug!(credentials_id = %credential.id, domain = %domain, "Stored credential in memory");
                slot.insert((domain.clone(), credential));
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CredentialsProvider for InMemoryCredentialsStore {
    async fn lookup_credentials(&self, lookup: &CredentialLookup) -> Result<Vec<StoredCredential>> {
        Ok(self
            .credentials
            .iter()
            .filter(|entry| lookup.matches(&entry.value().0, &entry.value().1))
            .map(|entry| entry.value().1.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EncryptedSecret;

    fn credential(id: &str) -> StoredCredential {
        StoredCredential::username_password(
            CredentialsId::from(id),
            "test",
            "smtp-user",
            EncryptedSecret::new("s3cret"),
        )
    }

    #[tokio::test]
    async fn test_add_and_lookup() {
        let store = InMemoryCredentialsStore::new();
        store.add_credentials(&CredentialDomain::global(), credential("a")).await.unwrap();

        assert_eq!(store.len(), 1);
        let found = store
            .find_credential(&CredentialLookup::username_password(), &CredentialsId::from("a"))
            .await
            .unwrap();
        assert_eq!(found.username, "smtp-user");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let store = InMemoryCredentialsStore::new();
        let domain = CredentialDomain::global();
        store.add_credentials(&domain, credential("a")).await.unwrap();

        let err = store.add_credentials(&domain, credential("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_named_domain_hidden_without_requirement() {
        let store = InMemoryCredentialsStore::new();
        store
            .add_credentials(&CredentialDomain::named("smtp.example.com"), credential("a"))
            .await
            .unwrap();

        let found = store.lookup_credentials(&CredentialLookup::username_password()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_missing_credential() {
        let store = InMemoryCredentialsStore::new();
        let err = store
            .find_credential(&CredentialLookup::username_password(), &CredentialsId::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
