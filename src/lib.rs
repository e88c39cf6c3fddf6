//! # SMTP Credentials
//!
//! Moves SMTP authentication details that older mailer configurations kept
//! inline (a username plus an encrypted password) into a credential store,
//! and rewrites the record to reference the stored credential by id.
//!
//! ## Architecture
//!
//! ```text
//! RecordFile → SmtpAuthenticationLoader → MigrationExecutor → CredentialsStore
//!                                                              (file, vault, memory)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use smtp_credentials::config::AppConfig;
//! use smtp_credentials::secrets::open_store;
//! use smtp_credentials::services::SmtpAuthenticationLoader;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> smtp_credentials::Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let handle = open_store(&config.store).await?;
//!     let loader = SmtpAuthenticationLoader::from_config(handle.store, &config.migration);
//!     let loaded = loader.load(Path::new("smtp-auth.json")).await?;
//!     println!("{:?}", loaded.record.credentials_id());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod services;
pub mod storage;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use domain::{CredentialsId, EncryptedSecret, SmtpAuthentication, SmtpAuthenticationDocument};
pub use errors::{Error, Result};
pub use observability::init_logging;
pub use services::{MigrationError, MigrationExecutor, MigrationOutcome, SmtpAuthenticationLoader};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
