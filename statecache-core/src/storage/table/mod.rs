//! Per-account persistent table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;

use super::error::{StorageError, StorageResult};
use super::keys::{self, HandleKeys};
use super::slots::{RootSlot, ScalarSlot};
use super::traits::MasterKey;
use super::types::{Handle, NodeRecord};
use super::{maintenance, scalars, sqlite};

mod contacts;
mod cursor;
mod nodes;
mod transaction;
pub(crate) mod util;


pub use cursor::{CursorSelector, ShareScope};
pub use transaction::TableTransaction;

use cursor::Cursor;
use nodes::ChildKind;
use util::{handle_from_sql, map_db_err};

/// Local mirror of one account's nodes, users and pending contacts.
///
/// Created by [`StoreFactory::open`](crate::StoreFactory::open). Owns its
/// connection and at most one active cursor. Dropping the table rolls back
/// any open transaction and closes the file; [`remove`](Self::remove) also
/// deletes it.
///
/// Not `Sync`: callers serialize access, and a transaction between
/// [`begin`](Self::begin) and [`commit`](Self::commit) belongs to whoever
/// started it.
pub struct StateTable {
    conn: Connection,
    master_key: Arc<dyn MasterKey>,
    path: PathBuf,
    cursor: Cursor,
}

impl StateTable {
    pub(crate) fn new(conn: Connection, master_key: Arc<dyn MasterKey>, path: PathBuf) -> Self {
        Self {
            conn,
            master_key,
            path,
            cursor: Cursor::Idle,
        }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Scalar slots ────────────────────────────────────────────────────

    /// Reads a scalar slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_scalar(&self, slot: ScalarSlot) -> StorageResult<Option<Vec<u8>>> {
        scalars::get(&self.conn, slot)
    }

    /// Writes a scalar slot, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReservedSlot`] for the handle key slots, or an
    /// error if the upsert fails.
    pub fn put_scalar(&self, slot: ScalarSlot, content: &[u8]) -> StorageResult<()> {
        if slot.is_handle_key() {
            return Err(StorageError::ReservedSlot(slot));
        }
        scalars::put(&self.conn, slot, content)
    }

    /// Reads the sync cursor token.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn sync_token(&self) -> StorageResult<Option<Vec<u8>>> {
        self.get_scalar(ScalarSlot::SyncToken)
    }

    /// Stores the sync cursor token.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn put_sync_token(&self, token: &[u8]) -> StorageResult<()> {
        self.put_scalar(ScalarSlot::SyncToken, token)
    }

    /// Reads a root handle reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn root_node(&self, root: RootSlot) -> StorageResult<Option<Vec<u8>>> {
        self.get_scalar(ScalarSlot::Root(root))
    }

    /// Stores a root handle reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn put_root_node(&self, root: RootSlot, content: &[u8]) -> StorageResult<()> {
        self.put_scalar(ScalarSlot::Root(root), content)
    }

    /// Reads and decodes the handle obfuscation keys provisioned when the
    /// store was created. Never generates new keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingHandleKey`] if a slot is empty, or a
    /// crypto/decode error if a slot does not hold a key sealed by this
    /// table's master key.
    pub fn read_handle_keys(&self) -> StorageResult<HandleKeys> {
        keys::read(&self.conn, self.master_key.as_ref())
    }

    // ── Nodes ───────────────────────────────────────────────────────────

    /// Returns the payload of the node with `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn node_by_handle(&self, handle: Handle) -> StorageResult<Option<Vec<u8>>> {
        nodes::get_by_handle(&self.conn, handle)
    }

    /// Returns the payload of the first node with `fingerprint`.
    ///
    /// Fingerprints are not unique; which match is returned is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn node_by_fingerprint(&self, fingerprint: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        nodes::get_by_fingerprint(&self.conn, fingerprint)
    }

    /// Returns the full stored row of the node with `handle`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row holds an unknown share
    /// state.
    pub fn node_record(&self, handle: Handle) -> StorageResult<Option<NodeRecord>> {
        nodes::get_record(&self.conn, handle)
    }

    /// Counts the nodes whose parent is `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_children(&self, parent: Handle) -> StorageResult<u64> {
        nodes::count_children(&self.conn, parent, ChildKind::Any)
    }

    /// Counts the files (nodes with a fingerprint) under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_child_files(&self, parent: Handle) -> StorageResult<u64> {
        nodes::count_children(&self.conn, parent, ChildKind::Files)
    }

    /// Counts the folders (nodes without a fingerprint) under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_child_folders(&self, parent: Handle) -> StorageResult<u64> {
        nodes::count_children(&self.conn, parent, ChildKind::Folders)
    }

    /// Inserts or replaces a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn put_node(&self, record: &NodeRecord) -> StorageResult<()> {
        nodes::put(&self.conn, record)
    }

    /// Deletes a node. Deleting a missing node is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_node(&self, handle: Handle) -> StorageResult<()> {
        nodes::delete(&self.conn, handle)
    }

    // ── Users and pending contacts ──────────────────────────────────────

    /// Inserts or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn put_user(&self, handle: Handle, payload: &[u8]) -> StorageResult<()> {
        contacts::put_user(&self.conn, handle, payload)
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_user(&self, handle: Handle) -> StorageResult<()> {
        contacts::delete_user(&self.conn, handle)
    }

    /// Inserts or replaces a pending contact request.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn put_pending_contact(&self, id: Handle, payload: &[u8]) -> StorageResult<()> {
        contacts::put_pending_contact(&self.conn, id, payload)
    }

    /// Deletes a pending contact request.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_pending_contact(&self, id: Handle) -> StorageResult<()> {
        contacts::delete_pending_contact(&self.conn, id)
    }

    // ── Cursor ──────────────────────────────────────────────────────────

    /// Starts enumerating `selector`, discarding any active cursor.
    pub fn start_cursor(&mut self, selector: CursorSelector) {
        if self.cursor.is_active() {
            log::debug!("discarding active cursor for {selector:?}");
        }
        self.cursor = Cursor::start(selector);
    }

    /// Returns the payload of the next row, or `None` once the cursor is
    /// exhausted or if no cursor is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the step query fails; the cursor is released.
    pub fn advance(&mut self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .cursor
            .advance(&self.conn)?
            .map(|(_, payload)| payload))
    }

    /// Returns the key of the next row (node handle, user handle or request
    /// id), or `None` once the cursor is exhausted or if no cursor is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the step query fails; the cursor is released.
    pub fn advance_handle(&mut self) -> StorageResult<Option<Handle>> {
        Ok(self
            .cursor
            .advance(&self.conn)?
            .map(|(key, _)| handle_from_sql(key)))
    }

    /// Returns `true` while a cursor is active.
    #[must_use]
    pub const fn cursor_active(&self) -> bool {
        self.cursor.is_active()
    }

    // ── Transactions ────────────────────────────────────────────────────

    /// Begins a transaction. Nested calls fail.
    ///
    /// # Errors
    ///
    /// Returns an error if `BEGIN` fails, including when a transaction is
    /// already open.
    pub fn begin(&self) -> StorageResult<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|err| map_db_err(&err))
    }

    /// Commits the open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if `COMMIT` fails or no transaction is open.
    pub fn commit(&self) -> StorageResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|err| map_db_err(&err))
    }

    /// Rolls back the open transaction. Does nothing if none is open.
    ///
    /// # Errors
    ///
    /// Returns an error if `ROLLBACK` fails.
    pub fn abort(&self) -> StorageResult<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|err| map_db_err(&err))
    }

    /// Returns `true` while a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Begins a transaction that rolls back when the returned guard drops
    /// without [`TableTransaction::commit`].
    ///
    /// # Errors
    ///
    /// Returns an error if `BEGIN` fails.
    pub fn transaction(&mut self) -> StorageResult<TableTransaction<'_>> {
        TableTransaction::begin(self)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Deletes every row of every table, handle keys included.
    ///
    /// Runs atomically on its own, or as part of the caller's transaction if
    /// one is open.
    ///
    /// Handle keys are only provisioned when the file is created, so
    /// [`read_handle_keys`](Self::read_handle_keys) returns
    /// [`StorageError::MissingHandleKey`] afterwards. To get keys again,
    /// [`remove`](Self::remove) the store and reopen it.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails; nothing is deleted in that case
    /// unless the caller's transaction is later committed.
    pub fn truncate(&self) -> StorageResult<()> {
        const TRUNCATE: &str = "DELETE FROM init;
             DELETE FROM nodes;
             DELETE FROM users;
             DELETE FROM pcrs;";
        if self.in_transaction() {
            return self
                .conn
                .execute_batch(TRUNCATE)
                .map_err(|err| map_db_err(&err));
        }
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|err| map_db_err(&err))?;
        tx.execute_batch(TRUNCATE).map_err(|err| map_db_err(&err))?;
        tx.commit().map_err(|err| map_db_err(&err))?;
        log::debug!("state cache truncated: {}", self.path.display());
        Ok(())
    }

    /// Runs `PRAGMA integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot run.
    pub fn check_integrity(&self) -> StorageResult<bool> {
        sqlite::integrity_check(&self.conn).map_err(|err| map_db_err(&err))
    }

    /// Closes the table and permanently deletes its backing file.
    ///
    /// Any active cursor is released and any open transaction rolled back
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be deleted.
    pub fn remove(self) -> StorageResult<()> {
        let path = self.path.clone();
        drop(self);
        maintenance::delete_store_files(&path)?;
        log::debug!("state cache removed: {}", path.display());
        Ok(())
    }
}

impl std::fmt::Debug for StateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTable")
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Drop for StateTable {
    fn drop(&mut self) {
        self.cursor.release();
        if let Err(err) = self.abort() {
            log::warn!("rollback on close failed: {err}");
        }
        log::debug!("state cache closed: {}", self.path.display());
    }
}
