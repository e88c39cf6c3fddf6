//! Credential domain types
//!
//! This module contains the entities exchanged with a credential store:
//! the [`StoredCredential`] written by a migration, its [`CredentialsScope`],
//! the [`CredentialDomain`] it lives in, and the [`EncryptedSecret`] carried
//! over from the legacy record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::id::CredentialsId;

/// Visibility scope of a stored credential
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsScope {
    /// Available to every consumer of the store
    #[default]
    Global,
}

impl CredentialsScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
        }
    }
}

impl FromStr for CredentialsScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            _ => Err(format!("Unknown credentials scope: {}", s)),
        }
    }
}

impl fmt::Display for CredentialsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of credential a lookup asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    #[default]
    UsernamePassword,
}

/// Partition of a credential store.
///
/// The global domain has no name and matches every lookup. Named domains only
/// match lookups that carry a hostname requirement equal to the domain name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl CredentialDomain {
    /// The unnamed domain every migrated credential is written to
    pub fn global() -> Self {
        Self { name: None }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_global(&self) -> bool {
        self.name.is_none()
    }

    /// Storage key of the domain. The global domain is `_`.
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or("_")
    }

    pub fn from_key(key: &str) -> Self {
        if key == "_" {
            Self::global()
        } else {
            Self::named(key)
        }
    }

    /// Whether credentials of this domain satisfy every requirement
    pub fn matches(&self, requirements: &[DomainRequirement]) -> bool {
        match &self.name {
            None => true,
            Some(name) => requirements.iter().any(|r| match r {
                DomainRequirement::Hostname(host) => host.eq_ignore_ascii_case(name),
            }),
        }
    }
}

impl fmt::Display for CredentialDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => write!(f, "global"),
            Some(name) => write!(f, "{}", name),
        }
    }
}

/// Constraint a consumer places on the domains it wants credentials from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainRequirement {
    Hostname(String),
}

/// An already-encrypted secret value.
///
/// The ciphertext is moved between the legacy record and the credential store
/// unchanged; this crate never decrypts it. Unlike a plaintext secret it is
/// serialized as-is so it can be persisted, but it is still redacted in
/// `Debug`/`Display` output and zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self(ciphertext.into())
    }

    /// Returns the encrypted value.
    ///
    /// Only needed when writing to a store or to disk. Never log the result.
    pub fn encrypted_value(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for EncryptedSecret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EncryptedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(EncryptedSecret(value))
    }
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedSecret([REDACTED])")
    }
}

impl fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for EncryptedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for EncryptedSecret {}

impl From<&str> for EncryptedSecret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EncryptedSecret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Username/password credential owned by a credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub id: CredentialsId,
    #[serde(default)]
    pub scope: CredentialsScope,
    pub description: String,
    pub username: String,
    #[serde(rename = "password")]
    pub encrypted_secret: EncryptedSecret,
}

impl StoredCredential {
    /// Global-scope username/password credential
    pub fn username_password(
        id: CredentialsId,
        description: impl Into<String>,
        username: impl Into<String>,
        encrypted_secret: EncryptedSecret,
    ) -> Self {
        Self {
            id,
            scope: CredentialsScope::Global,
            description: description.into(),
            username: username.into(),
            encrypted_secret,
        }
    }

    pub fn kind(&self) -> CredentialKind {
        CredentialKind::UsernamePassword
    }

    /// Label shown when listing credentials: `username/****** (description)`
    pub fn display_label(&self) -> String {
        if self.description.is_empty() {
            format!("{}/******", self.username)
        } else {
            format!("{}/****** ({})", self.username, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_roundtrip() {
        let parsed: CredentialsScope = CredentialsScope::Global.as_str().parse().unwrap();
        assert_eq!(parsed, CredentialsScope::Global);
        assert!("system".parse::<CredentialsScope>().is_err());
        assert!("folder".parse::<CredentialsScope>().is_err());
    }

    #[test]
    fn test_global_domain_matches_everything() {
        let global = CredentialDomain::global();
        assert!(global.matches(&[]));
        assert!(global.matches(&[DomainRequirement::Hostname("smtp.example.com".into())]));
        assert_eq!(global.key(), "_");
        assert_eq!(CredentialDomain::from_key("_"), global);
    }

    #[test]
    fn test_named_domain_needs_matching_hostname() {
        let domain = CredentialDomain::named("smtp.example.com");
        assert!(!domain.matches(&[]));
        assert!(domain.matches(&[DomainRequirement::Hostname("SMTP.example.com".into())]));
        assert!(!domain.matches(&[DomainRequirement::Hostname("imap.example.com".into())]));
        assert_eq!(CredentialDomain::from_key("smtp.example.com"), domain);
    }

    #[test]
    fn test_encrypted_secret_redacts_debug_and_display() {
        let secret = EncryptedSecret::new("{AQAAABAAAAAQ}");
        assert_eq!(format!("{:?}", secret), "EncryptedSecret([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_encrypted_secret_persists_ciphertext() {
        let secret = EncryptedSecret::new("{AQAAABAAAAAQ}");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"{AQAAABAAAAAQ}\"");
        let back: EncryptedSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_stored_credential_debug_hides_secret() {
        let credential = StoredCredential::username_password(
            CredentialsId::from("id-1"),
            "Mailer SMTP authentication credentials (migrated)",
            "smtp-user",
            EncryptedSecret::new("s3cret"),
        );
        let debug = format!("{:?}", credential);
        assert!(debug.contains("smtp-user"));
        assert!(!debug.contains("s3cret"));
        assert_eq!(credential.scope, CredentialsScope::Global);
    }

    #[test]
    fn test_display_label() {
        let credential = StoredCredential::username_password(
            CredentialsId::from("id-1"),
            "relay",
            "smtp-user",
            EncryptedSecret::new("s3cret"),
        );
        assert_eq!(credential.display_label(), "smtp-user/****** (relay)");
    }
}
