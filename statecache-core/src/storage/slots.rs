//! Reserved singleton slots of the `init` table.
//!
//! The `init` table is a key/value map with a closed key set. Every row id in
//! use is named here; call sites never pass raw integers.

use std::fmt;

/// Root-handle references kept alongside the sync token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootSlot {
    /// Root of the cloud drive.
    Files,
    /// Root of the inbox.
    Inbox,
    /// Root of the rubbish bin.
    Rubbish,
}

impl RootSlot {
    /// All root slots, in id order.
    pub const ALL: [Self; 3] = [Self::Files, Self::Inbox, Self::Rubbish];
}

/// A row of the `init` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarSlot {
    /// Sync cursor token (id 0).
    SyncToken,
    /// Root handle reference (ids 1-3).
    Root(RootSlot),
    /// Sealed node-handle obfuscation key (id 4).
    NodeHandleKey,
    /// Sealed parent-handle obfuscation key (id 5).
    ParentHandleKey,
}

impl ScalarSlot {
    /// Row id of the slot in the `init` table.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::SyncToken => 0,
            Self::Root(RootSlot::Files) => 1,
            Self::Root(RootSlot::Inbox) => 2,
            Self::Root(RootSlot::Rubbish) => 3,
            Self::NodeHandleKey => 4,
            Self::ParentHandleKey => 5,
        }
    }

    /// Returns `true` for the slots written only during key provisioning.
    #[must_use]
    pub const fn is_handle_key(self) -> bool {
        matches!(self, Self::NodeHandleKey | Self::ParentHandleKey)
    }

    /// Associated data bound to the sealed contents of a key slot.
    pub(crate) const fn key_associated_data(self) -> &'static [u8] {
        match self {
            Self::ParentHandleKey => b"statecache:parent-handle-key",
            _ => b"statecache:node-handle-key",
        }
    }
}

impl fmt::Display for ScalarSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
