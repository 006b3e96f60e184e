//! Authenticated encryption of key store sections using ChaCha20-Poly1305.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::kdf::DerivedKey;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypted bytes with the nonce needed to decrypt them.
///
/// Serialized as one base64 string holding the nonce followed by the
/// ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    /// The ciphertext, auth tag included.
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Encodes to base64 for storage.
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(&bytes)
    }

    /// Decodes from base64.
    pub fn from_base64(encoded: &str) -> KeyStoreResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| KeyStoreError::Decryption(format!("invalid base64: {e}")))?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(KeyStoreError::Decryption("data too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

impl Serialize for EncryptedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for EncryptedData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(D::Error::custom)
    }
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> KeyStoreResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| KeyStoreError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts data produced by [`encrypt`] with the same key.
pub fn decrypt(key: &DerivedKey, encrypted: &EncryptedData) -> KeyStoreResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::from_slice(&encrypted.nonce);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| {
            KeyStoreError::Decryption("wrong passphrase or tampered data".to_string())
        })
}
