//! Shared helpers for table operations.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::Handle;

pub(crate) fn map_db_err(err: &rusqlite::Error) -> StorageError {
    StorageError::Query(err.to_string())
}

/// Handles are stored as the `INTEGER` with the same bit pattern.
pub(crate) const fn handle_to_sql(handle: Handle) -> i64 {
    i64::from_ne_bytes(handle.to_ne_bytes())
}

pub(crate) const fn handle_from_sql(value: i64) -> Handle {
    u64::from_ne_bytes(value.to_ne_bytes())
}

pub(crate) fn count_from_sql(value: i64) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Query(format!("negative row count: {value}")))
}
