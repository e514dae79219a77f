//! Shared `SQLite` helpers for state cache files.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

/// Opens a `SQLite` connection with consistent flags, creating the file if
/// needed.
pub(crate) fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    // Forces the header read so a non-database file fails here and not on
    // the first query.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(conn)
}

/// Runs an integrity check.
pub(crate) fn integrity_check(conn: &Connection) -> rusqlite::Result<bool> {
    let result: String = conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
    Ok(result.trim() == "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("new.db");
        let conn = open_connection(&path).expect("open");
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .expect("create");
        assert!(path.exists());
        assert!(integrity_check(&conn).expect("integrity"));
    }

    #[test]
    fn test_open_garbage_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![0xA5u8; 4096]).expect("write garbage");
        assert!(open_connection(&path).is_err());
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("x.db");
        assert!(open_connection(&path).is_err());
    }
}
