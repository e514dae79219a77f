//! Backing file removal.

use std::fs;
use std::path::Path;

use super::error::{StorageError, StorageResult};
use super::paths::sidecar_paths;

/// Deletes the database file and its WAL/SHM sidecar files if present.
///
/// # Errors
///
/// Returns an error for IO failures other than missing files.
pub(crate) fn delete_store_files(path: &Path) -> StorageResult<()> {
    delete_if_exists(path)?;
    for sidecar in sidecar_paths(path) {
        delete_if_exists(&sidecar)?;
    }
    Ok(())
}

/// Deletes the file at `path` if it exists.
///
/// # Errors
///
/// Returns an error for IO failures other than missing files.
fn delete_if_exists(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StorageError::Io(format!("{}: {err}", path.display()))),
    }
}
