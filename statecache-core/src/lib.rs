#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Per-account persistent state cache.
//!
//! Mirrors the nodes, users and pending contact requests of one account into a
//! local `SQLite` file so a client can resume without a full reload. Open a
//! store with [`StoreFactory::open`] and work through the returned
//! [`StateTable`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use statecache_core::{
//!     CursorSelector, StatecachePaths, StoreFactory, StoreOptions, XChaChaMasterKey,
//! };
//!
//! # fn main() -> statecache_core::StorageResult<()> {
//! let factory = StoreFactory::new(StatecachePaths::new("/tmp/cache"), StoreOptions::default());
//! let mut table = factory.open("alice", Arc::new(XChaChaMasterKey::generate()))?;
//! table.put_user(42, b"serialized user")?;
//! table.start_cursor(CursorSelector::Users);
//! while let Some(user) = table.advance()? {
//!     println!("{} bytes", user.len());
//! }
//! # Ok(())
//! # }
//! ```

/// Routes log records to a host-provided sink.
pub mod logger;

pub mod storage;

pub use storage::{
    CursorSelector, Handle, HandleKeys, JournalMode, MasterKey, NodeRecord, RootSlot, ScalarSlot,
    ShareScope, ShareState, StateTable, StatecachePaths, StorageError, StorageResult,
    StoreFactory, StoreOptions, Synchronous, TableTransaction, XChaChaMasterKey,
    HANDLE_KEY_LENGTH,
};
