//! Opens per-account state cache files.

use std::fs;
use std::sync::Arc;

use super::error::{StorageError, StorageResult};
use super::options::StoreOptions;
use super::paths::StatecachePaths;
use super::table::StateTable;
use super::traits::MasterKey;
use super::{keys, maintenance, schema, sqlite};

/// Creates [`StateTable`]s rooted in one directory.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    paths: StatecachePaths,
    options: StoreOptions,
}

impl StoreFactory {
    /// Creates a factory for stores under `paths`.
    #[must_use]
    pub const fn new(paths: StatecachePaths, options: StoreOptions) -> Self {
        Self { paths, options }
    }

    /// Returns the configured paths.
    #[must_use]
    pub const fn paths(&self) -> &StatecachePaths {
        &self.paths
    }

    /// Opens the store for `name`, creating it if absent.
    ///
    /// A newly created store gets a pair of random handle keys sealed with
    /// `master_key`. An existing store is opened as-is; its keys must have
    /// been sealed by the same master key to be readable.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidName`] if `name` cannot be used as a file name.
    /// - [`StorageError::Open`] if the directory or file cannot be opened.
    /// - [`StorageError::SchemaInit`] if the tables cannot be created.
    /// - [`StorageError::KeyProvisioning`] if the handle keys cannot be
    ///   stored. The file is left behind; remove it with
    ///   [`discard`](Self::discard).
    pub fn open(&self, name: &str, master_key: Arc<dyn MasterKey>) -> StorageResult<StateTable> {
        let path = self.paths.db_path(name)?;
        fs::create_dir_all(self.paths.root()).map_err(|err| {
            StorageError::Open(format!("create {}: {err}", self.paths.root().display()))
        })?;
        let conn = sqlite::open_connection(&path)
            .map_err(|err| StorageError::Open(format!("{}: {err}", path.display())))?;
        self.options.apply(&conn);
        let fresh = schema::ensure_schema(&conn)?;
        if fresh {
            keys::provision(&conn, master_key.as_ref())?;
        }
        log::debug!("state cache opened: {} (fresh: {fresh})", path.display());
        Ok(StateTable::new(conn, master_key, path))
    }

    /// Deletes the file of the store `name` and its journal sidecars.
    ///
    /// Missing files are not an error. The store must not be open.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for an unusable name, or
    /// [`StorageError::Io`] if a file exists but cannot be deleted.
    pub fn discard(&self, name: &str) -> StorageResult<()> {
        let path = self.paths.db_path(name)?;
        maintenance::delete_store_files(&path)?;
        log::debug!("state cache discarded: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::XChaChaMasterKey;

    struct FailingMasterKey;

    impl MasterKey for FailingMasterKey {
        fn seal(&self, _associated_data: &[u8], _plaintext: &[u8]) -> StorageResult<Vec<u8>> {
            Err(StorageError::Crypto("keystore locked".to_string()))
        }

        fn open(&self, _associated_data: &[u8], _ciphertext: &[u8]) -> StorageResult<Vec<u8>> {
            Err(StorageError::Crypto("keystore locked".to_string()))
        }
    }

    fn factory(root: &std::path::Path) -> StoreFactory {
        StoreFactory::new(StatecachePaths::new(root), StoreOptions::default())
    }

    #[test]
    fn test_open_creates_root_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("cache");
        let table = factory(&root)
            .open("alice", Arc::new(XChaChaMasterKey::generate()))
            .expect("open");
        assert_eq!(table.path(), root.join("megaclient_statecache7_alice.db"));
        assert!(table.path().exists());
    }

    #[test]
    fn test_failed_provisioning_reports_and_discard_cleans_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let factory = factory(dir.path());
        let err = factory
            .open("alice", Arc::new(FailingMasterKey))
            .expect_err("provisioning should fail");
        assert!(matches!(err, StorageError::KeyProvisioning(_)));

        let path = factory.paths().db_path("alice").expect("path");
        assert!(path.exists());
        factory.discard("alice").expect("discard");
        assert!(!path.exists());
    }

    #[test]
    fn test_root_that_is_a_file_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("not-a-dir");
        fs::write(&root, b"x").expect("write file");
        let err = factory(&root)
            .open("alice", Arc::new(XChaChaMasterKey::generate()))
            .expect_err("open should fail");
        assert!(matches!(err, StorageError::Open(_)));
    }

    #[test]
    fn test_invalid_name_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = factory(dir.path())
            .open("../escape", Arc::new(XChaChaMasterKey::generate()))
            .expect_err("name should be rejected");
        assert!(matches!(err, StorageError::InvalidName(_)));
    }

    #[test]
    fn test_discard_missing_store_is_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        factory(dir.path()).discard("nobody").expect("discard");
    }
}
