//! Handle obfuscation keys.
//!
//! Two independent random keys are generated when a store is created: one for
//! node handles and one for parent handles, so the folder structure cannot be
//! inferred from the relationship between the two columns. Each key is
//! base64-encoded, sealed with the account master key and kept in its own
//! `init` slot. This layer only provisions and reads them back.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use rusqlite::Connection;
use zeroize::{Zeroize, Zeroizing};

use super::{
    error::{StorageError, StorageResult},
    scalars,
    slots::ScalarSlot,
    traits::MasterKey,
};

/// Length in bytes of each handle obfuscation key.
pub const HANDLE_KEY_LENGTH: usize = 16;

/// The two handle obfuscation keys of a store.
///
/// Key bytes are zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct HandleKeys {
    node_key: [u8; HANDLE_KEY_LENGTH],
    parent_key: [u8; HANDLE_KEY_LENGTH],
}

impl HandleKeys {
    /// Key for node handles (slot 4). Treat as sensitive material.
    #[must_use]
    pub const fn node_key(&self) -> &[u8; HANDLE_KEY_LENGTH] {
        &self.node_key
    }

    /// Key for parent handles (slot 5). Treat as sensitive material.
    #[must_use]
    pub const fn parent_key(&self) -> &[u8; HANDLE_KEY_LENGTH] {
        &self.parent_key
    }
}

impl std::fmt::Debug for HandleKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleKeys").finish_non_exhaustive()
    }
}

impl Drop for HandleKeys {
    fn drop(&mut self) {
        self.node_key.zeroize();
        self.parent_key.zeroize();
    }
}

/// Generates, seals and stores both handle keys.
///
/// Only called on a freshly created store. Both slots are written in one
/// transaction: either both keys are stored or neither is.
pub(crate) fn provision(conn: &Connection, master_key: &dyn MasterKey) -> StorageResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|err| StorageError::KeyProvisioning(err.to_string()))?;
    for slot in [ScalarSlot::NodeHandleKey, ScalarSlot::ParentHandleKey] {
        let sealed = seal_new_key(master_key, slot)?;
        scalars::put(&tx, slot, &sealed)
            .map_err(|err| StorageError::KeyProvisioning(err.to_string()))?;
    }
    tx.commit()
        .map_err(|err| StorageError::KeyProvisioning(err.to_string()))?;
    log::debug!("provisioned handle keys");
    Ok(())
}

/// Reads both handle keys back, node key first.
pub(crate) fn read(conn: &Connection, master_key: &dyn MasterKey) -> StorageResult<HandleKeys> {
    let node_key = read_slot(conn, master_key, ScalarSlot::NodeHandleKey)?;
    let parent_key = read_slot(conn, master_key, ScalarSlot::ParentHandleKey)?;
    Ok(HandleKeys {
        node_key: *node_key,
        parent_key: *parent_key,
    })
}

fn seal_new_key(master_key: &dyn MasterKey, slot: ScalarSlot) -> StorageResult<Vec<u8>> {
    let mut key = Zeroizing::new([0u8; HANDLE_KEY_LENGTH]);
    OsRng
        .try_fill_bytes(&mut key[..])
        .map_err(|err| StorageError::KeyProvisioning(format!("rng failure: {err}")))?;
    let encoded = Zeroizing::new(URL_SAFE_NO_PAD.encode(&key[..]));
    master_key
        .seal(slot.key_associated_data(), encoded.as_bytes())
        .map_err(|err| StorageError::KeyProvisioning(err.to_string()))
}

fn read_slot(
    conn: &Connection,
    master_key: &dyn MasterKey,
    slot: ScalarSlot,
) -> StorageResult<Zeroizing<[u8; HANDLE_KEY_LENGTH]>> {
    let sealed = scalars::get(conn, slot)?.ok_or(StorageError::MissingHandleKey(slot))?;
    let encoded = Zeroizing::new(master_key.open(slot.key_associated_data(), &sealed)?);
    let decoded = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(encoded.as_slice())
            .map_err(|err| StorageError::KeyDecode(format!("slot {slot}: {err}")))?,
    );
    if decoded.len() != HANDLE_KEY_LENGTH {
        return Err(StorageError::KeyDecode(format!(
            "slot {slot} length mismatch: expected {HANDLE_KEY_LENGTH}, got {}",
            decoded.len()
        )));
    }
    let mut out = Zeroizing::new([0u8; HANDLE_KEY_LENGTH]);
    out.copy_from_slice(&decoded);
    Ok(out)
}
