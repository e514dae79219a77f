//! Scoped transaction over a [`StateTable`].

use std::ops::{Deref, DerefMut};

use crate::storage::error::StorageResult;

use super::StateTable;

/// An open table transaction.
///
/// Derefs to the table so puts and deletes go through the guard.
/// Automatically rolls back on drop unless explicitly committed.
pub struct TableTransaction<'table> {
    table: &'table mut StateTable,
    committed: bool,
}

impl<'table> TableTransaction<'table> {
    /// Begins a new transaction on `table`.
    pub(super) fn begin(table: &'table mut StateTable) -> StorageResult<Self> {
        table.begin()?;
        Ok(Self {
            table,
            committed: false,
        })
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the transaction is then rolled
    /// back when the guard drops.
    pub fn commit(mut self) -> StorageResult<()> {
        self.table.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl Deref for TableTransaction<'_> {
    type Target = StateTable;

    fn deref(&self) -> &StateTable {
        self.table
    }
}

impl DerefMut for TableTransaction<'_> {
    fn deref_mut(&mut self) -> &mut StateTable {
        self.table
    }
}

impl std::fmt::Debug for TableTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableTransaction")
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

impl Drop for TableTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            // Best-effort rollback.
            if let Err(err) = self.table.abort() {
                log::warn!("rollback of abandoned transaction failed: {err}");
            }
        }
    }
}
