//! SMTP authentication record
//!
//! [`SmtpAuthentication`] is the configuration object being migrated. Older
//! persisted state carries the username and encrypted password inline; current
//! state carries only a [`CredentialsId`] pointing into a credential store.
//!
//! The two shapes are held in a single [`CredentialBinding`] so the switch from
//! one to the other is one assignment. A record can never be observed with
//! its legacy fields cleared and no reference set, nor with both.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::credential::EncryptedSecret;
use super::id::CredentialsId;
use crate::errors::{Error, Result};

/// Persisted layout of an SMTP authentication record.
///
/// Field names follow the on-disk format, which predates this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpAuthenticationDocument {
    /// Deprecated inline username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Deprecated inline password, already encrypted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<EncryptedSecret>,

    /// Reference to a username/password credential in the credential store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_id: Option<CredentialsId>,
}

impl SmtpAuthenticationDocument {
    pub fn has_legacy_fields(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// Inline username/password pair from pre-migration state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCredentials {
    username: Option<String>,
    password: Option<EncryptedSecret>,
}

impl LegacyCredentials {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&EncryptedSecret> {
        self.password.as_ref()
    }
}

/// Where a record gets its SMTP credentials from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialBinding {
    /// Inline legacy fields, pending migration
    Legacy(LegacyCredentials),
    /// Reference into the credential store
    Referenced(CredentialsId),
}

/// SMTP authentication settings of a mailer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpAuthentication {
    binding: CredentialBinding,
}

impl SmtpAuthentication {
    /// Authentication backed by a credential in the store
    pub fn new(credentials_id: CredentialsId) -> Self {
        Self { binding: CredentialBinding::Referenced(credentials_id) }
    }

    /// Rebuild a record from its persisted layout.
    ///
    /// Legacy fields win over a reference: a document carrying both is
    /// treated as pending migration and its reference is replaced once the
    /// migration succeeds.
    pub fn from_document(document: SmtpAuthenticationDocument) -> Result<Self> {
        let SmtpAuthenticationDocument { username, password, credentials_id } = document;

        if username.is_some() || password.is_some() {
            if let Some(stale) = credentials_id {
                warn!(
                    credentials_id = %stale,
                    "SMTP authentication record carries both inline credentials and a credentials id; the inline credentials will be migrated"
                );
            }
            return Ok(Self { binding: CredentialBinding::Legacy(LegacyCredentials { username, password }) });
        }

        match credentials_id {
            Some(id) if !id.is_blank() => Ok(Self::new(id)),
            _ => Err(Error::validation_field(
                "SMTP authentication record carries neither inline credentials nor a credentials id",
                "credentialsId",
            )),
        }
    }

    /// Persisted layout of the record in its current state
    pub fn to_document(&self) -> SmtpAuthenticationDocument {
        match &self.binding {
            CredentialBinding::Legacy(legacy) => SmtpAuthenticationDocument {
                username: legacy.username.clone(),
                password: legacy.password.clone(),
                credentials_id: None,
            },
            CredentialBinding::Referenced(id) => SmtpAuthenticationDocument {
                username: None,
                password: None,
                credentials_id: Some(id.clone()),
            },
        }
    }

    /// Whether the record still holds inline credentials that must be moved
    /// into the credential store. Pure.
    pub fn requires_migration(&self) -> bool {
        match &self.binding {
            CredentialBinding::Legacy(legacy) => {
                legacy.username.is_some() || legacy.password.is_some()
            }
            CredentialBinding::Referenced(_) => false,
        }
    }

    pub fn binding(&self) -> &CredentialBinding {
        &self.binding
    }

    pub fn legacy_credentials(&self) -> Option<&LegacyCredentials> {
        match &self.binding {
            CredentialBinding::Legacy(legacy) => Some(legacy),
            CredentialBinding::Referenced(_) => None,
        }
    }

    pub fn legacy_username(&self) -> Option<&str> {
        self.legacy_credentials().and_then(LegacyCredentials::username)
    }

    pub fn legacy_password(&self) -> Option<&EncryptedSecret> {
        self.legacy_credentials().and_then(LegacyCredentials::password)
    }

    /// The store reference, once the record has been migrated
    pub fn credentials_id(&self) -> Option<&CredentialsId> {
        match &self.binding {
            CredentialBinding::Referenced(id) => Some(id),
            CredentialBinding::Legacy(_) => None,
        }
    }

    /// Swap the inline credentials for a reference in one assignment.
    ///
    /// Only the migration executor calls this, and only after the store has
    /// accepted the credential behind `credentials_id`.
    pub(crate) fn complete_migration(&mut self, credentials_id: CredentialsId) {
        self.binding = CredentialBinding::Referenced(credentials_id);
    }
}
