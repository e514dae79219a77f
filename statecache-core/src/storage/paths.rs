//! Storage path helpers.

use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// File name prefix used by existing state cache files.
pub const DEFAULT_FILE_PREFIX: &str = "megaclient_statecache7_";
/// File name extension used by existing state cache files.
pub const DEFAULT_FILE_EXTENSION: &str = ".db";

/// Location and naming of state cache files.
///
/// A store named `name` lives at `<root>/<prefix><name><extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatecachePaths {
    root: PathBuf,
    prefix: String,
    extension: String,
}

impl StatecachePaths {
    /// Builds paths rooted at `root` with the default naming convention.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            prefix: DEFAULT_FILE_PREFIX.to_string(),
            extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }

    /// Overrides the file name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Overrides the file name extension (including the leading dot).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Returns the directory holding state cache files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the store for the account-scoped `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] if `name` is empty or contains a
    /// path separator or NUL byte.
    pub fn db_path(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name == ".." {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self
            .root
            .join(format!("{}{name}{}", self.prefix, self.extension)))
    }
}

/// Returns the WAL and SHM sidecar paths of a database file.
pub(crate) fn sidecar_paths(db_path: &Path) -> [PathBuf; 2] {
    let mut wal = db_path.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = db_path.as_os_str().to_owned();
    shm.push("-shm");
    [PathBuf::from(wal), PathBuf::from(shm)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming() {
        let paths = StatecachePaths::new("/tmp/statecache");
        assert_eq!(
            paths.db_path("abc123").expect("path"),
            PathBuf::from("/tmp/statecache/megaclient_statecache7_abc123.db")
        );
    }

    #[test]
    fn test_custom_naming() {
        let paths = StatecachePaths::new("/data")
            .with_prefix("cache_")
            .with_extension(".sqlite");
        assert_eq!(
            paths.db_path("acct").expect("path"),
            PathBuf::from("/data/cache_acct.sqlite")
        );
    }

    #[test]
    fn test_rejects_names_escaping_root() {
        let paths = StatecachePaths::new("/data");
        for name in ["", "a/b", "a\\b", "nul\0", ".."] {
            match paths.db_path(name) {
                Err(StorageError::InvalidName(_)) => {}
                other => panic!("unexpected result for {name:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_sidecar_paths_append_suffix() {
        let [wal, shm] = sidecar_paths(Path::new("/data/x.db"));
        assert_eq!(wal, PathBuf::from("/data/x.db-wal"));
        assert_eq!(shm, PathBuf::from("/data/x.db-shm"));
    }
}
