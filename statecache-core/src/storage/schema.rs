//! State cache schema.
//!
//! The layout is shared with existing state cache files and must not change:
//! table names, column names and column affinities are part of the format.

use rusqlite::{Connection, OptionalExtension};

use super::error::{StorageError, StorageResult};

const CREATE_STATEMENTS: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS init (
        id      INTEGER PRIMARY KEY NOT NULL,
        content BLOB    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS nodes (
        nodehandle   INTEGER PRIMARY KEY NOT NULL,
        parenthandle INTEGER NOT NULL,
        fingerprint  BLOB,
        attrstring   TEXT,
        shared       INTEGER NOT NULL,
        node         BLOB    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        userhandle INTEGER PRIMARY KEY NOT NULL,
        user       BLOB    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pcrs (
        id  INTEGER PRIMARY KEY NOT NULL,
        pcr BLOB    NOT NULL
    )",
];

/// Creates the four tables if missing.
///
/// Returns `true` when the `init` table did not exist beforehand, i.e. the
/// store is fresh and still needs its handle keys.
pub(crate) fn ensure_schema(conn: &Connection) -> StorageResult<bool> {
    let fresh = !init_table_exists(conn)?;
    for sql in CREATE_STATEMENTS {
        conn.execute_batch(sql)
            .map_err(|err| StorageError::SchemaInit(err.to_string()))?;
    }
    Ok(fresh)
}

fn init_table_exists(conn: &Connection) -> StorageResult<bool> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'init'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| StorageError::SchemaInit(err.to_string()))?;
    Ok(name.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .expect("query");
        rows.collect::<Result<_, _>>().expect("collect")
    }

    #[test]
    fn test_first_run_is_fresh() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        assert!(ensure_schema(&conn).expect("schema"));
        assert_eq!(table_names(&conn), vec!["init", "nodes", "pcrs", "users"]);
    }

    #[test]
    fn test_second_run_is_not_fresh() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&conn).expect("schema");
        assert!(!ensure_schema(&conn).expect("schema again"));
    }

    #[test]
    fn test_existing_init_table_is_reused() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(
            "CREATE TABLE init (id INTEGER PRIMARY KEY NOT NULL, content BLOB NOT NULL);
             INSERT INTO init (id, content) VALUES (0, x'01');",
        )
        .expect("seed");
        assert!(!ensure_schema(&conn).expect("schema"));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM init", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}
