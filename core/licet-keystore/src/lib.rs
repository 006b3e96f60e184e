//! Ed25519 key storage for licet.
//!
//! A [`KeyStore`] keeps named Ed25519 key pairs (or bare public keys) in a
//! single passphrase-protected file:
//!
//! - passphrases are stretched with Argon2id ([`derive_key`]);
//! - the entry table and every private seed are sealed with
//!   ChaCha20-Poly1305 ([`encrypt`] / [`decrypt`]).
//!
//! [`Ed25519Provider`] exposes stores through the
//! [`licet_cert::CryptoProvider`] seam so certificates can be signed and
//! verified against them.

mod cipher;
mod error;
mod kdf;
mod provider;
mod signing;
mod store;

pub use cipher::{EncryptedData, NONCE_SIZE, TAG_SIZE, decrypt, encrypt};
pub use error::{KeyStoreError, KeyStoreResult};
pub use kdf::{DerivedKey, KEY_SIZE, KdfParams, SALT_SIZE, Salt, derive_key};
pub use provider::{ED25519, Ed25519Provider};
pub use signing::{KeyPair, SIGNATURE_LENGTH, SigningKey, VerifyingKey};
pub use store::{KeyStore, STORE_FORMAT, STORE_VERSION};
