//! # Configuration Settings
//!
//! Defines the configuration structure for SMTP credential migration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

use crate::errors::{Error, Result};

/// Retry budget used when nothing else is configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Subject named in migrated credential descriptions
pub const DEFAULT_SUBJECT: &str = "Mailer SMTP";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Migration behaviour
    #[validate(nested)]
    pub migration: MigrationConfig,

    /// Credential store selection
    #[validate(nested)]
    pub store: StoreConfig,

    /// Logging configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if self.store.backend == StoreBackend::File
            && self.store.file_path.as_os_str().is_empty()
        {
            return Err(Error::validation_field(
                "File credential store needs a file path",
                "store.file_path",
            ));
        }

        Ok(())
    }
}

/// Migration executor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MigrationConfig {
    /// Maximum number of store writes attempted per migration
    #[validate(range(min = 1, max = 100, message = "Max attempts must be between 1 and 100"))]
    pub max_attempts: u32,

    /// Subject used in the migrated credential description,
    /// `"<subject> authentication credentials (migrated)"`
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: String,

    /// Write the migrated record back to disk after a successful migration
    pub persist_migrated: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            subject: DEFAULT_SUBJECT.to_string(),
            persist_migrated: true,
        }
    }
}

/// Credential store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Vault,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Vault => "vault",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "vault" => Ok(Self::Vault),
            _ => Err(format!("Unknown credential store backend: {}", s)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to open
    pub backend: StoreBackend,

    /// Path of the file store document
    pub file_path: PathBuf,

    /// Vault connection settings, used by the vault backend
    #[validate(nested)]
    pub vault: VaultConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            file_path: PathBuf::from("credentials.json"),
            vault: VaultConfig::default(),
        }
    }
}

/// Configuration for the HashiCorp Vault credential store.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault authentication token
    pub token: Option<String>,

    /// Vault namespace (Enterprise feature)
    pub namespace: Option<String>,

    /// KV v2 mount path
    #[validate(length(min = 1, message = "Vault mount path cannot be empty"))]
    pub mount_path: String,

    /// Folder below the mount that holds credentials
    #[validate(length(min = 1, message = "Vault path prefix cannot be empty"))]
    pub path_prefix: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: "secret".to_string(),
            path_prefix: "credentials".to_string(),
        }
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("mount_path", &self.mount_path)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.migration.max_attempts, 10);
        assert_eq!(config.migration.subject, "Mailer SMTP");
        assert!(config.migration.persist_migrated);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.vault.mount_path, "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = AppConfig::default();
        config.migration.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Max attempts"));
    }

    #[test]
    fn test_empty_file_path_rejected() {
        let mut config = AppConfig::default();
        config.store.file_path = PathBuf::new();
        assert!(matches!(config.validate(), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("Vault".parse::<StoreBackend>().unwrap(), StoreBackend::Vault);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("s3".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_vault_debug_redacts_token() {
        let config = VaultConfig { token: Some("hvs.secret".to_string()), ..Default::default() };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hvs.secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [migration]
            max_attempts = 3

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.migration.max_attempts, 3);
        assert_eq!(config.migration.subject, "Mailer SMTP");
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }
}
