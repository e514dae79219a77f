//! User and pending contact request rows.

use rusqlite::{params, Connection};

use crate::storage::error::StorageResult;
use crate::storage::types::Handle;

use super::util::{handle_to_sql, map_db_err};

pub(super) fn put_user(conn: &Connection, handle: Handle, payload: &[u8]) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO users (userhandle, user) VALUES (?1, ?2)",
        params![handle_to_sql(handle), payload],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}

pub(super) fn delete_user(conn: &Connection, handle: Handle) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM users WHERE userhandle = ?1",
        params![handle_to_sql(handle)],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}

pub(super) fn put_pending_contact(
    conn: &Connection,
    id: Handle,
    payload: &[u8],
) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO pcrs (id, pcr) VALUES (?1, ?2)",
        params![handle_to_sql(id), payload],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}

pub(super) fn delete_pending_contact(conn: &Connection, id: Handle) -> StorageResult<()> {
    conn.execute("DELETE FROM pcrs WHERE id = ?1", params![handle_to_sql(id)])
        .map_err(|err| map_db_err(&err))?;
    Ok(())
}
