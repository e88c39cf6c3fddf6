//! Credential identifiers with the NewType pattern
//!
//! [`CredentialsId`] is the opaque reference a migrated record keeps in place
//! of its inline username and password. New identifiers are random UUID v4
//! values (122 random bits plus version/variant) in canonical hyphenated form;
//! identifiers read back from persisted state are accepted verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a credential held by a credential store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialsId(String);

impl CredentialsId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier read from persisted state or a store
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to inner string value
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse and validate a generated (UUID) identifier
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s)?;
        Ok(Self(s.to_string()))
    }

    /// Whether the identifier is blank
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CredentialsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CredentialsId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CredentialsId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CredentialsId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CredentialsId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<CredentialsId> for String {
    fn from(id: CredentialsId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_canonical_uuids() {
        let id = CredentialsId::generate();
        let parsed = Uuid::parse_str(id.as_str()).expect("generated id should be a uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str(), parsed.hyphenated().to_string());
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_ten_thousand_ids_are_unique() {
        let ids: HashSet<CredentialsId> = (0..10_000).map(|_| CredentialsId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_parse_rejects_non_uuid() {
        assert!(CredentialsId::parse("not-a-uuid").is_err());
        assert!("smtp-creds".parse::<CredentialsId>().is_err());
    }

    #[test]
    fn test_persisted_ids_are_kept_verbatim() {
        let id = CredentialsId::from_string("smtp-relay".to_string());
        assert_eq!(id.as_str(), "smtp-relay");
        assert_eq!(String::from(id), "smtp-relay");
    }

    #[test]
    fn test_serde_transparent() {
        let id = CredentialsId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: CredentialsId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_blank() {
        assert!(CredentialsId::from("  ").is_blank());
        assert!(!CredentialsId::generate().is_blank());
    }
}
