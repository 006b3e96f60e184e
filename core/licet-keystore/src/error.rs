//! Error types for the key store.

use licet_persist::PersistError;
use thiserror::Error;

/// Result type for key store operations.
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Errors that can occur while managing or using a key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// Reading or writing the store file failed.
    #[error("key store file error: {0}")]
    Persist(#[from] PersistError),

    /// The file is not a key store this version understands.
    #[error("unsupported key store: {0}")]
    Unsupported(String),

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong passphrase or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("no entry for alias {0:?}")]
    AliasNotFound(String),

    #[error("alias {0:?} is already in use")]
    AliasExists(String),

    /// The entry only holds a public key.
    #[error("entry {0:?} has no private key")]
    NoPrivateKey(String),

    /// Stored key bytes are not a valid Ed25519 key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
