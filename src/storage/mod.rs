//! # Storage Layer
//!
//! On-disk persistence for SMTP authentication records, plus the atomic file
//! replacement shared with the file credential store.

pub mod record_file;

pub use record_file::RecordFile;

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Replace `path` with `bytes` so readers see either the old or the new
/// content, never a partial write.
///
/// The content is staged in a uniquely named temporary file next to `path`,
/// so concurrent writers never share a staging file. A failed write removes
/// its temporary file.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut staged = NamedTempFile::new_in(parent_dir(path))?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Async form of [`write_atomically`], run on the blocking pool.
pub async fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let path: PathBuf = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
        .await
        .map_err(std::io::Error::other)?
}
