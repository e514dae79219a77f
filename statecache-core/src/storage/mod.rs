//! Per-account state cache storage: factory, table, keys and configuration.

pub mod error;
pub mod factory;
pub mod keys;
pub mod options;
pub mod paths;
pub mod slots;
pub mod table;
pub mod traits;
pub mod types;

mod maintenance;
mod scalars;
mod schema;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use factory::StoreFactory;
pub use keys::{HandleKeys, HANDLE_KEY_LENGTH};
pub use options::{JournalMode, StoreOptions, Synchronous};
pub use paths::StatecachePaths;
pub use slots::{RootSlot, ScalarSlot};
pub use table::{CursorSelector, ShareScope, StateTable, TableTransaction};
pub use traits::{MasterKey, XChaChaMasterKey};
pub use types::{Handle, NodeRecord, ShareState};
