//! # Configuration Management
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. `.env` files are honoured through `dotenvy`
//! by the binary before [`AppConfig::load`] runs.
//!
//! | Variable | Setting |
//! |---|---|
//! | `SMTP_CREDENTIALS_MAX_ATTEMPTS` | `migration.max_attempts` |
//! | `SMTP_CREDENTIALS_SUBJECT` | `migration.subject` |
//! | `SMTP_CREDENTIALS_PERSIST_MIGRATED` | `migration.persist_migrated` |
//! | `SMTP_CREDENTIALS_STORE` | `store.backend` |
//! | `SMTP_CREDENTIALS_STORE_PATH` | `store.file_path` |
//! | `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`, `VAULT_MOUNT_PATH` | `store.vault.*` |
//! | `SMTP_CREDENTIALS_VAULT_PREFIX` | `store.vault.path_prefix` |
//! | `SMTP_CREDENTIALS_LOG_LEVEL` | `observability.log_level` |
//! | `SMTP_CREDENTIALS_LOG_JSON` | `observability.json_logging` |

pub mod settings;

pub use settings::{
    AppConfig, MigrationConfig, ObservabilityConfig, StoreBackend, StoreConfig, VaultConfig,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_SUBJECT,
};

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Environment variable prefix for settings.
pub const ENV_PREFIX: &str = "SMTP_CREDENTIALS_";

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, format!("Failed to read config file {}", path.display())))?;
        Ok(toml::from_str(&raw)?)
    }

    /// Override settings from environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(value) = var("MAX_ATTEMPTS") {
            self.migration.max_attempts = parse_var("SMTP_CREDENTIALS_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = var("SUBJECT") {
            self.migration.subject = value;
        }
        if let Some(value) = var("PERSIST_MIGRATED") {
            self.migration.persist_migrated =
                parse_var("SMTP_CREDENTIALS_PERSIST_MIGRATED", &value)?;
        }
        if let Some(value) = var("STORE") {
            self.store.backend = value.parse().map_err(Error::config)?;
        }
        if let Some(value) = var("STORE_PATH") {
            self.store.file_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("VAULT_ADDR") {
            self.store.vault.address = value;
        }
        if let Some(value) = lookup("VAULT_TOKEN") {
            self.store.vault.token = Some(value);
        }
        if let Some(value) = lookup("VAULT_NAMESPACE") {
            self.store.vault.namespace = Some(value);
        }
        if let Some(value) = lookup("VAULT_MOUNT_PATH") {
            self.store.vault.mount_path = value;
        }
        if let Some(value) = var("VAULT_PREFIX") {
            self.store.vault.path_prefix = value;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.observability.log_level = value;
        }
        if let Some(value) = var("LOG_JSON") {
            self.observability.json_logging = parse_var("SMTP_CREDENTIALS_LOG_JSON", &value)?;
        }

        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| Error::config(format!("Invalid {}: {}", name, e)))
}
