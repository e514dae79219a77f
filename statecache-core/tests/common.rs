//! Common test utilities shared across integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use statecache_core::{
    MasterKey, StatecachePaths, StorageResult, StoreFactory, StoreOptions, XChaChaMasterKey,
};
use tempfile::TempDir;

/// Master key that counts how often it seals.
#[allow(dead_code, reason = "used in tests")]
pub struct CountingMasterKey {
    inner: XChaChaMasterKey,
    seals: AtomicUsize,
}

impl CountingMasterKey {
    /// Wraps `key` with a zeroed seal counter.
    #[allow(dead_code, reason = "used in tests")]
    pub fn new(key: [u8; 32]) -> Arc<Self> {
        Arc::new(Self {
            inner: XChaChaMasterKey::new(key),
            seals: AtomicUsize::new(0),
        })
    }

    /// Number of `seal` calls so far.
    #[allow(dead_code, reason = "used in tests")]
    pub fn seals(&self) -> usize {
        self.seals.load(Ordering::SeqCst)
    }
}

impl MasterKey for CountingMasterKey {
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        self.seals.fetch_add(1, Ordering::SeqCst);
        self.inner.seal(associated_data, plaintext)
    }

    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>> {
        self.inner.open(associated_data, ciphertext)
    }
}

/// Factory rooted in a fresh temporary directory. Keep the `TempDir` alive
/// for as long as the stores are used.
#[allow(dead_code, reason = "used in tests")]
pub fn temp_factory() -> (TempDir, StoreFactory) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let factory = StoreFactory::new(StatecachePaths::new(dir.path()), StoreOptions::default());
    (dir, factory)
}
