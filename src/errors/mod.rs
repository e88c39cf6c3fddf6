//! # Error Handling
//!
//! Crate-wide error type for loading, migrating and persisting SMTP
//! authentication records. Store and migration failures keep their own enums
//! ([`StoreError`], [`MigrationError`]) and convert into [`Error`] at the
//! boundary.

pub mod types;

pub use types::{Error, Result};

pub use crate::secrets::StoreError;
pub use crate::services::MigrationError;
