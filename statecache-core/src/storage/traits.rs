//! Collaborator interfaces for the state cache.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use super::error::{StorageError, StorageResult};

const NONCE_LEN: usize = 24;

/// Account master key used to seal the handle obfuscation keys.
///
/// The table keeps a shared reference for its whole lifetime and uses it
/// again whenever [`read_handle_keys`](crate::StateTable::read_handle_keys)
/// is called.
pub trait MasterKey: Send + Sync {
    /// Seals plaintext, authenticating `associated_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher refuses the operation.
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>>;

    /// Opens ciphertext produced by [`seal`](Self::seal) with the same
    /// associated data.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails or the input is malformed.
    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>>;
}

/// XChaCha20-Poly1305 master key.
///
/// Output layout is `nonce (24 bytes) || ciphertext || tag`.
pub struct XChaChaMasterKey {
    key: Zeroizing<[u8; 32]>,
}

impl XChaChaMasterKey {
    /// Wraps raw key material.
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Generates a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::new(key)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.key[..]))
    }
}

impl std::fmt::Debug for XChaChaMasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XChaChaMasterKey").finish_non_exhaustive()
    }
}

impl MasterKey for XChaChaMasterKey {
    fn seal(&self, associated_data: &[u8], plaintext: &[u8]) -> StorageResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(
                XNonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|err| StorageError::Crypto(err.to_string()))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open(&self, associated_data: &[u8], ciphertext: &[u8]) -> StorageResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(StorageError::Crypto(
                "sealed key ciphertext too short".to_string(),
            ));
        }
        let (nonce_bytes, payload) = ciphertext.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: payload,
                    aad: associated_data,
                },
            )
            .map_err(|err| StorageError::Crypto(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_with_same_key() {
        let key = XChaChaMasterKey::new([0x42u8; 32]);
        let sealed = key.seal(b"ad", b"secret").expect("seal");
        assert_ne!(sealed.as_slice(), b"secret");
        assert_eq!(key.open(b"ad", &sealed).expect("open"), b"secret");
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let sealed = XChaChaMasterKey::new([0x01u8; 32])
            .seal(b"ad", b"secret")
            .expect("seal");
        let err = XChaChaMasterKey::new([0x02u8; 32])
            .open(b"ad", &sealed)
            .expect_err("wrong key");
        assert!(matches!(err, StorageError::Crypto(_)));
    }

    #[test]
    fn test_open_with_other_associated_data_fails() {
        let key = XChaChaMasterKey::generate();
        let sealed = key.seal(b"node", b"secret").expect("seal");
        assert!(key.open(b"parent", &sealed).is_err());
    }

    #[test]
    fn test_open_truncated_input_fails() {
        let key = XChaChaMasterKey::generate();
        match key.open(b"ad", &[0u8; 3]) {
            Err(StorageError::Crypto(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
