//! Sequential enumeration over one selector at a time.
//!
//! The cursor does not keep a statement stepping between calls; a rusqlite
//! statement borrows its connection. Each step instead runs a cached keyset
//! query that resumes after the last key returned:
//!
//! ```text
//! SELECT key, payload FROM table
//! WHERE (predicate) AND key > ?1
//! ORDER BY key LIMIT 1
//! ```
//!
//! The first step uses `key >= i64::MIN`. Both forms seek on the primary
//! key, so a full enumeration stays linear in the number of rows.
//!
//! Keys are primary keys, so every matching row is visited exactly once in
//! ascending (signed) key order, and rows written between steps do not shift
//! the position.

use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::storage::error::StorageResult;
use crate::storage::types::{Handle, ShareState};

use super::util::{handle_to_sql, map_db_err};

/// How a parent-scoped share selector combines the parent filter with the
/// "outgoing and pending" share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareScope {
    /// `parent = P AND (share = S OR share = outgoing+pending)`.
    #[default]
    Parent,
    /// `(parent = P AND share = S) OR share = outgoing+pending`.
    ///
    /// Every node in the combined state matches regardless of its parent.
    /// Kept for callers that depend on the behavior of older clients.
    LegacyUnscopedCombined,
}

/// Row subset enumerated by a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorSelector {
    /// Every user.
    Users,
    /// Every pending contact request.
    PendingContacts,
    /// Nodes whose parent handle is `parent`.
    Children {
        /// Parent handle.
        parent: Handle,
    },
    /// Nodes that still carry an undecrypted attribute string.
    EncryptedNodes,
    /// Nodes with an outgoing share, optionally restricted to one parent.
    OutShares {
        /// Parent handle filter.
        parent: Option<Handle>,
        /// Parent filter precedence; ignored when `parent` is `None`.
        scope: ShareScope,
    },
    /// Nodes with a pending share, optionally restricted to one parent.
    PendingShares {
        /// Parent handle filter.
        parent: Option<Handle>,
        /// Parent filter precedence; ignored when `parent` is `None`.
        scope: ShareScope,
    },
}

struct Query {
    table: &'static str,
    key: &'static str,
    payload: &'static str,
    predicate: String,
    parent: Option<Handle>,
}

impl CursorSelector {
    fn query(self) -> Query {
        let nodes = |predicate: String, parent: Option<Handle>| Query {
            table: "nodes",
            key: "nodehandle",
            payload: "node",
            predicate,
            parent,
        };
        match self {
            Self::Users => Query {
                table: "users",
                key: "userhandle",
                payload: "user",
                predicate: "1".to_string(),
                parent: None,
            },
            Self::PendingContacts => Query {
                table: "pcrs",
                key: "id",
                payload: "pcr",
                predicate: "1".to_string(),
                parent: None,
            },
            Self::Children { parent } => nodes("parenthandle = ?2".to_string(), Some(parent)),
            Self::EncryptedNodes => nodes("attrstring IS NOT NULL".to_string(), None),
            Self::OutShares { parent, scope } => {
                nodes(share_predicate(ShareState::Outgoing, parent, scope), parent)
            }
            Self::PendingShares { parent, scope } => {
                nodes(share_predicate(ShareState::Pending, parent, scope), parent)
            }
        }
    }
}

fn share_predicate(state: ShareState, parent: Option<Handle>, scope: ShareScope) -> String {
    let single = state.as_i64();
    let combined = ShareState::OutgoingAndPending.as_i64();
    match (parent, scope) {
        (None, _) => format!("shared = {single} OR shared = {combined}"),
        (Some(_), ShareScope::Parent) => {
            format!("parenthandle = ?2 AND (shared = {single} OR shared = {combined})")
        }
        (Some(_), ShareScope::LegacyUnscopedCombined) => {
            format!("parenthandle = ?2 AND shared = {single} OR shared = {combined}")
        }
    }
}

/// Cursor state owned by a table.
#[derive(Debug, Default)]
pub(super) enum Cursor {
    #[default]
    Idle,
    Active {
        steps: StepQueries,
        last_key: Option<i64>,
    },
}

/// Step statements of an active cursor, built once when it starts.
///
/// Both bind the lower key bound as `?1` and the parent (if any) as `?2`,
/// and both are rowid range seeks.
#[derive(Debug)]
pub(super) struct StepQueries {
    first: String,
    next: String,
    parent: Option<i64>,
}

impl StepQueries {
    fn new(selector: CursorSelector) -> Self {
        let Query {
            table,
            key,
            payload,
            predicate,
            parent,
        } = selector.query();
        let step = |op: &str| {
            format!(
                "SELECT {key}, {payload} FROM {table}
                 WHERE ({predicate}) AND {key} {op} ?1
                 ORDER BY {key} LIMIT 1"
            )
        };
        Self {
            first: step(">="),
            next: step(">"),
            parent: parent.map(handle_to_sql),
        }
    }

    fn sql_for(&self, last_key: Option<i64>) -> (&str, i64) {
        match last_key {
            None => (self.first.as_str(), i64::MIN),
            Some(key) => (self.next.as_str(), key),
        }
    }
}

impl Cursor {
    pub(super) fn start(selector: CursorSelector) -> Self {
        Self::Active {
            steps: StepQueries::new(selector),
            last_key: None,
        }
    }

    pub(super) const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub(super) fn release(&mut self) {
        *self = Self::Idle;
    }

    /// Returns the next `(key, payload)` row, or `None` once exhausted.
    ///
    /// Exhaustion and query failures both return the cursor to idle.
    pub(super) fn advance(&mut self, conn: &Connection) -> StorageResult<Option<(i64, Vec<u8>)>> {
        let Self::Active { steps, last_key } = self else {
            return Ok(None);
        };
        match next_row(conn, steps, *last_key) {
            Ok(Some((key, payload))) => {
                *last_key = Some(key);
                Ok(Some((key, payload)))
            }
            Ok(None) => {
                self.release();
                Ok(None)
            }
            Err(err) => {
                self.release();
                Err(err)
            }
        }
    }
}

fn next_row(
    conn: &Connection,
    steps: &StepQueries,
    last_key: Option<i64>,
) -> StorageResult<Option<(i64, Vec<u8>)>> {
    let (sql, bound) = steps.sql_for(last_key);
    let mut stmt = conn.prepare_cached(sql).map_err(|err| map_db_err(&err))?;
    let mut params = vec![bound];
    params.extend(steps.parent);
    stmt.query_row(params_from_iter(params), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?))
    })
    .optional()
    .map_err(|err| map_db_err(&err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_scope_groups_share_terms() {
        assert_eq!(
            share_predicate(ShareState::Outgoing, Some(7), ShareScope::Parent),
            "parenthandle = ?2 AND (shared = 1 OR shared = 4)"
        );
        assert_eq!(
            share_predicate(ShareState::Pending, Some(7), ShareScope::LegacyUnscopedCombined),
            "parenthandle = ?2 AND shared = 3 OR shared = 4"
        );
        assert_eq!(
            share_predicate(ShareState::Pending, None, ShareScope::Parent),
            "shared = 3 OR shared = 4"
        );
    }

    #[test]
    fn test_idle_cursor_is_exhausted() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        let mut cursor = Cursor::default();
        assert!(cursor.advance(&conn).expect("advance").is_none());
        assert!(!cursor.is_active());
    }

    #[test]
    fn test_failed_step_releases_cursor() {
        // No schema: the first step fails to prepare.
        let conn = Connection::open_in_memory().expect("open in-memory db");
        let mut cursor = Cursor::start(CursorSelector::Users);
        assert!(cursor.advance(&conn).is_err());
        assert!(!cursor.is_active());
    }

    fn schema_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        crate::storage::schema::ensure_schema(&conn).expect("schema");
        conn
    }

    fn query_plan(conn: &Connection, sql: &str, params: &[i64]) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("EXPLAIN QUERY PLAN {sql}"))
            .expect("prepare plan");
        stmt.query_map(params_from_iter(params), |row| row.get::<_, String>(3))
            .expect("query plan")
            .collect::<Result<_, _>>()
            .expect("plan rows")
    }

    #[test]
    fn test_drains_large_table_in_key_order() {
        let conn = schema_conn();
        let tx = conn.unchecked_transaction().expect("begin");
        for key in (0..3000i64).rev() {
            tx.execute(
                "INSERT INTO users (userhandle, user) VALUES (?1, ?2)",
                rusqlite::params![key - 1500, key.to_le_bytes().to_vec()],
            )
            .expect("insert");
        }
        tx.commit().expect("commit");

        let mut cursor = Cursor::start(CursorSelector::Users);
        let mut keys = Vec::new();
        while let Some((key, _)) = cursor.advance(&conn).expect("advance") {
            keys.push(key);
        }
        assert_eq!(keys, (-1500..1500).collect::<Vec<_>>());
        assert!(!cursor.is_active());
    }

    #[test]
    fn test_steps_seek_on_primary_key() {
        let conn = schema_conn();
        for selector in [
            CursorSelector::Users,
            CursorSelector::PendingContacts,
            CursorSelector::Children { parent: 9 },
            CursorSelector::EncryptedNodes,
            CursorSelector::OutShares {
                parent: Some(9),
                scope: ShareScope::LegacyUnscopedCombined,
            },
        ] {
            let steps = StepQueries::new(selector);
            let mut params = vec![0];
            params.extend(steps.parent);
            for sql in [&steps.first, &steps.next] {
                let plan = query_plan(&conn, sql, &params);
                assert!(
                    plan.iter()
                        .any(|detail| detail.starts_with("SEARCH") && detail.contains("rowid>")),
                    "{selector:?}: {plan:?}"
                );
                assert!(
                    !plan.iter().any(|detail| detail.starts_with("SCAN")),
                    "{selector:?}: {plan:?}"
                );
            }
        }
    }

    #[test]
    fn test_first_step_includes_lowest_key() {
        let conn = schema_conn();
        conn.execute(
            "INSERT INTO pcrs (id, pcr) VALUES (?1, x'01')",
            [i64::MIN],
        )
        .expect("insert");
        let mut cursor = Cursor::start(CursorSelector::PendingContacts);
        assert_eq!(
            cursor.advance(&conn).expect("advance").map(|(key, _)| key),
            Some(i64::MIN)
        );
        assert!(cursor.advance(&conn).expect("advance").is_none());
    }
}
