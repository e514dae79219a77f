//! Connection durability options.

use rusqlite::Connection;
use strum::{Display, EnumString};

/// `SQLite` journal mode requested when a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum JournalMode {
    /// Write-ahead log.
    #[default]
    Wal,
    /// Rollback journal, deleted at the end of each transaction.
    Delete,
    /// Rollback journal, truncated instead of deleted.
    Truncate,
    /// Rollback journal, header zeroed instead of deleted.
    Persist,
}

/// `SQLite` `synchronous` level requested when a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Synchronous {
    /// Sync at every critical moment, including every WAL commit.
    #[default]
    Full,
    /// Sync less often; a WAL commit may roll back after power loss.
    Normal,
    /// Leave syncing to the operating system.
    Off,
}

/// Durability settings applied to every opened store.
///
/// Both settings are best-effort: a host that does not support one keeps
/// its current value and the store still opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    /// Journal mode; defaults to WAL.
    pub journal_mode: JournalMode,
    /// Sync level; defaults to FULL.
    pub synchronous: Synchronous,
}

impl StoreOptions {
    /// Applies the options to `conn`, logging instead of failing.
    pub(crate) fn apply(self, conn: &Connection) {
        let journal_mode = self.journal_mode.to_string();
        match conn.pragma_update_and_check(None, "journal_mode", &journal_mode, |row| {
            row.get::<_, String>(0)
        }) {
            Ok(mode) if mode.eq_ignore_ascii_case(&journal_mode) => {}
            Ok(mode) => log::warn!("journal_mode {journal_mode} not applied, using {mode}"),
            Err(err) => log::warn!("failed to set journal_mode {journal_mode}: {err}"),
        }
        if let Err(err) = conn.pragma_update(None, "synchronous", self.synchronous.to_string()) {
            log::warn!("failed to set synchronous {}: {err}", self.synchronous);
        }
    }
}
