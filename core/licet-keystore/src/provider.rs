//! [`CryptoProvider`] backed by key store files.

use licet_cert::{BoxError, CryptoProvider, PrivateKeyRef, PublicKeyRef};
use tracing::debug;

use crate::store::KeyStore;

/// Name under which Ed25519 signatures are recorded.
pub const ED25519: &str = "Ed25519";

/// Signs and verifies with Ed25519 keys held in [`KeyStore`] files.
///
/// Every call opens the store named by the key reference, so key material
/// never outlives the operation that needed it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Provider;

impl Ed25519Provider {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for Ed25519Provider {
    fn algorithm(&self) -> &str {
        ED25519
    }

    fn sign(&self, message: &[u8], key: &PrivateKeyRef) -> Result<Vec<u8>, BoxError> {
        let store = KeyStore::open(key.store(), key.store_passphrase())?;
        let signing_key = store.signing_key(key.alias(), key.key_passphrase())?;
        debug!(alias = key.alias(), len = message.len(), "signing");
        Ok(signing_key.sign(message).to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8], key: &PublicKeyRef) -> Result<bool, BoxError> {
        let store = KeyStore::open(key.store(), key.store_passphrase())?;
        let verifying_key = store.verifying_key(key.alias())?;
        Ok(verifying_key.verify(message, signature))
    }
}
