//! Error types for the state cache storage layer.

use thiserror::Error;

use super::slots::ScalarSlot;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the state cache.
///
/// Opening a store can fail with [`Open`](Self::Open),
/// [`SchemaInit`](Self::SchemaInit) or
/// [`KeyProvisioning`](Self::KeyProvisioning); all three are terminal for the
/// open call. Everything else is scoped to a single operation and leaves the
/// table usable.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be opened or created.
    #[error("failed to open state cache: {0}")]
    Open(String),

    /// Table creation failed while preparing the schema.
    #[error("schema initialization failed: {0}")]
    SchemaInit(String),

    /// Generating, encoding, sealing or persisting a handle key failed.
    #[error("handle key provisioning failed: {0}")]
    KeyProvisioning(String),

    /// A single prepare/bind/execute step failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Cryptographic failures from the master key.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// A stored handle key could not be decoded.
    #[error("handle key decode error: {0}")]
    KeyDecode(String),

    /// A handle key slot is empty.
    #[error("handle key missing from slot {0}")]
    MissingHandleKey(ScalarSlot),

    /// The slot is written only by key provisioning.
    #[error("slot {0} is reserved for handle keys")]
    ReservedSlot(ScalarSlot),

    /// The account-scoped name cannot be turned into a file name.
    #[error("invalid store name: {0:?}")]
    InvalidName(String),

    /// A node row carries a share state outside the known set.
    #[error("invalid share state: {0}")]
    InvalidShareState(i64),

    /// Filesystem errors while managing the backing file.
    #[error("io error: {0}")]
    Io(String),
}
