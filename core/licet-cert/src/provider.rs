//! Collaborator seams: signing/verification and canonical encoding.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::BoxError;

/// A secret passphrase, wiped from memory on drop.
///
/// Deserializes from a plain string so configuration files can hand secrets
/// over without an intermediate copy. It is never serialized.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wraps a passphrase.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret text.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Passphrase {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Passphrase {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}

/// Locates a public key: key store, alias, and the store passphrase.
#[derive(Debug, Clone)]
pub struct PublicKeyRef {
    store: PathBuf,
    alias: String,
    store_passphrase: Passphrase,
}

impl PublicKeyRef {
    pub fn new(
        store: impl Into<PathBuf>,
        alias: impl Into<String>,
        store_passphrase: Passphrase,
    ) -> Self {
        Self {
            store: store.into(),
            alias: alias.into(),
            store_passphrase,
        }
    }

    /// The key-store locator.
    #[must_use]
    pub fn store(&self) -> &Path {
        &self.store
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn store_passphrase(&self) -> &Passphrase {
        &self.store_passphrase
    }
}

/// Locates a private key: everything a [`PublicKeyRef`] carries plus the
/// passphrase protecting the key entry itself.
#[derive(Debug, Clone)]
pub struct PrivateKeyRef {
    public: PublicKeyRef,
    key_passphrase: Passphrase,
}

impl PrivateKeyRef {
    pub fn new(public: PublicKeyRef, key_passphrase: Passphrase) -> Self {
        Self {
            public,
            key_passphrase,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Path {
        self.public.store()
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        self.public.alias()
    }

    #[must_use]
    pub fn store_passphrase(&self) -> &Passphrase {
        self.public.store_passphrase()
    }

    #[must_use]
    pub fn key_passphrase(&self) -> &Passphrase {
        &self.key_passphrase
    }

    /// The reference to the matching public key.
    #[must_use]
    pub fn public(&self) -> &PublicKeyRef {
        &self.public
    }
}

/// Asymmetric signing and verification backed by some key store.
///
/// `verify` returns `Ok(false)` for a signature that does not match (including
/// a malformed one); `Err` is reserved for failures to reach the key material.
pub trait CryptoProvider: Send + Sync {
    /// Name of the signature algorithm, recorded next to each signature.
    fn algorithm(&self) -> &str;

    /// Signs `message` with the referenced private key.
    fn sign(&self, message: &[u8], key: &PrivateKeyRef) -> Result<Vec<u8>, BoxError>;

    /// Checks `signature` over `message` with the referenced public key.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &PublicKeyRef,
    ) -> Result<bool, BoxError>;
}

/// Produces the canonical text encoding of certificate content and reads it
/// back.
pub trait ContentCodec<C> {
    fn encode(&self, content: &C) -> Result<String, BoxError>;

    fn decode(&self, encoded: &str) -> Result<C, BoxError>;
}
