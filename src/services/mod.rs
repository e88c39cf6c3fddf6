//! # Services
//!
//! Migration of inline SMTP credentials and the loader that runs it after a
//! record is read.

pub mod loader;
pub mod migration;

pub use loader::{unavailable_loader, LoadedRecord, SmtpAuthenticationLoader};
pub use migration::{MigrationError, MigrationExecutor, MigrationOutcome};
