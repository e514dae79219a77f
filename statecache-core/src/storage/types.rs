//! Public types for the state cache.

use super::error::{StorageError, StorageResult};

/// 64-bit identifier of a node, user or pending contact request.
pub type Handle = u64;

/// Sharing relationship of a node, as stored in `nodes.shared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ShareState {
    /// Not shared.
    #[default]
    None = 0,
    /// Shared with another account.
    Outgoing = 1,
    /// Shared with this account by someone else.
    Incoming = 2,
    /// Shared with a contact who has not accepted yet.
    Pending = 3,
    /// Both an outgoing and a pending share.
    OutgoingAndPending = 4,
}

impl ShareState {
    pub(crate) const fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for ShareState {
    type Error = StorageError;

    fn try_from(value: i64) -> StorageResult<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Outgoing),
            2 => Ok(Self::Incoming),
            3 => Ok(Self::Pending),
            4 => Ok(Self::OutgoingAndPending),
            _ => Err(StorageError::InvalidShareState(value)),
        }
    }
}

/// A row of the `nodes` table.
///
/// A node without a fingerprint is a folder; with one, a file. An empty
/// fingerprint is treated as absent when stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Handle of the node.
    pub handle: Handle,
    /// Handle of the parent. Not checked against existing nodes.
    pub parent: Handle,
    /// Content fingerprint, files only.
    pub fingerprint: Option<Vec<u8>>,
    /// Undecrypted attribute string, if the node still carries one.
    pub attr_string: Option<String>,
    /// Sharing relationship.
    pub share: ShareState,
    /// Serialized node, opaque to this layer.
    pub payload: Vec<u8>,
}

impl NodeRecord {
    /// Returns `true` if the record describes a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.fingerprint.as_ref().is_none_or(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_state_round_trips_through_column_value() {
        for state in [
            ShareState::None,
            ShareState::Outgoing,
            ShareState::Incoming,
            ShareState::Pending,
            ShareState::OutgoingAndPending,
        ] {
            assert_eq!(ShareState::try_from(state.as_i64()).expect("decode"), state);
        }
    }

    #[test]
    fn test_unknown_share_state_is_rejected() {
        match ShareState::try_from(9) {
            Err(StorageError::InvalidShareState(9)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_fingerprint_is_folder() {
        let mut record = NodeRecord {
            handle: 1,
            parent: 0,
            fingerprint: Some(Vec::new()),
            attr_string: None,
            share: ShareState::None,
            payload: vec![1],
        };
        assert!(record.is_folder());
        record.fingerprint = Some(b"f1".to_vec());
        assert!(!record.is_folder());
        record.fingerprint = None;
        assert!(record.is_folder());
    }
}
