//! Reads and upserts of `init` table slots.

use rusqlite::{params, Connection, OptionalExtension};

use super::error::StorageResult;
use super::slots::ScalarSlot;
use super::table::util::map_db_err;

pub(crate) fn get(conn: &Connection, slot: ScalarSlot) -> StorageResult<Option<Vec<u8>>> {
    conn.query_row(
        "SELECT content FROM init WHERE id = ?1",
        params![slot.id()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|err| map_db_err(&err))
}

pub(crate) fn put(conn: &Connection, slot: ScalarSlot, content: &[u8]) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO init (id, content) VALUES (?1, ?2)",
        params![slot.id(), content],
    )
    .map_err(|err| map_db_err(&err))?;
    Ok(())
}
