//! Persisted SMTP authentication record.
//!
//! A record file holds one [`SmtpAuthenticationDocument`] as JSON. Writes go
//! through [`atomic_write`], so the file only ever contains a complete
//! document: the pre-migration shape or the migrated one.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::atomic_write;
use crate::domain::SmtpAuthenticationDocument;
use crate::errors::{Error, Result};

/// JSON file holding one SMTP authentication record
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<SmtpAuthenticationDocument> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::io(e, format!("Failed to read SMTP authentication record {}", self.path.display()))
        })?;

        let document = serde_json::from_slice(&bytes).map_err(|e| {
            Error::serialization(
                e,
                format!("Failed to parse SMTP authentication record {}", self.path.display()),
            )
        })?;

        debug!(path = %self.path.display(), "Read SMTP authentication record");
        Ok(document)
    }

    pub async fn write(&self, document: &SmtpAuthenticationDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        atomic_write(&self.path, &bytes).await.map_err(|e| {
            Error::io(e, format!("Failed to write SMTP authentication record {}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), "Wrote SMTP authentication record");
        Ok(())
    }
}
