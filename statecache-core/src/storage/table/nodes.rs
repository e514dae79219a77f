//! Node rows.

use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::error::StorageResult;
use crate::storage::types::{Handle, NodeRecord, ShareState};

use super::util::{count_from_sql, handle_from_sql, handle_to_sql, map_db_err};

pub(super) fn get_by_handle(conn: &Connection, handle: Handle) -> StorageResult<Option<Vec<u8>>> {
    conn.query_row(
        "SELECT node FROM nodes WHERE nodehandle = ?1",
        params![handle_to_sql(handle)],
        |row| row.get(0),
    )
    .optional()
    .map_err(|err| map_db_err(&err))
}

pub(super) fn get_by_fingerprint(
    conn: &Connection,
    fingerprint: &[u8],
) -> StorageResult<Option<Vec<u8>>> {
    conn.query_row(
        "SELECT node FROM nodes WHERE fingerprint = ?1 LIMIT 1",
        params![fingerprint],
        |row| row.get(0),
    )
    .optional()
    .map_err(|err| map_db_err(&err))
}

pub(super) fn get_record(conn: &Connection, handle: Handle) -> StorageResult<Option<NodeRecord>> {
    let row = conn
        .query_row(
            "SELECT nodehandle, parenthandle, fingerprint, attrstring, shared, node
             FROM nodes
             WHERE nodehandle = ?1",
            params![handle_to_sql(handle)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<Vec<u8>>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                ))
            },
        )
        .optional()
        .map_err(|err| map_db_err(&err))?;
    let Some((handle, parent, fingerprint, attr_string, shared, payload)) = row else {
        return Ok(None);
    };
    Ok(Some(NodeRecord {
        handle: handle_from_sql(handle),
        parent: handle_from_sql(parent),
        fingerprint,
        attr_string,
        share: ShareState::try_from(shared)?,
        payload,
    }))
}

/// Which children of a parent to count.
#[derive(Debug, Clone, Copy)]
pub(super) enum ChildKind {
    Any,
    Files,
    Folders,
}

pub(super) fn count_children(
    conn: &Connection,
    parent: Handle,
    kind: ChildKind,
) -> StorageResult<u64> {
    let sql = match kind {
        ChildKind::Any => "SELECT COUNT(*) FROM nodes WHERE parenthandle = ?1",
        ChildKind::Files => {
            "SELECT COUNT(*) FROM nodes WHERE parenthandle = ?1 AND fingerprint IS NOT NULL"
        }
        ChildKind::Folders => {
            "SELECT COUNT(*) FROM nodes WHERE parenthandle = ?1 AND fingerprint IS NULL"
        }
    };
    let count: i64 = conn
        .query_row(sql, params![handle_to_sql(parent)], |row| row.get(0))
        .map_err(|err| map_db_err(&err))?;
    count_from_sql(count)
}

pub(super) fn put(conn: &Connection, record: &NodeRecord) -> StorageResult<()> {
    // An empty fingerprint marks a folder and is stored as NULL.
    let fingerprint = record
        .fingerprint
        .as_deref()
        .filter(|fingerprint| !fingerprint.is_empty());
    conn.execute(
        "INSERT OR REPLACE INTO nodes (
            nodehandle,
            parenthandle,
            fingerprint,
            attrstring,
            shared,
            node
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            handle_to_sql(record.handle),
            handle_to_sql(record.parent),
            fingerprint,
            record.attr_string.as_deref(),
            record.share.as_i64(),
            record.payload.as_slice()
        ],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}

pub(super) fn delete(conn: &Connection, handle: Handle) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM nodes WHERE nodehandle = ?1",
        params![handle_to_sql(handle)],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}
