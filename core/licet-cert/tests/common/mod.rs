//! Shared test helpers for certificate tests.

#![allow(dead_code)]

use std::collections::HashMap;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use licet_cert::{
    BoxError, ContentCodec, CryptoProvider, Passphrase, PrivateKeyRef, PublicKeyRef,
};
use serde::{Deserialize, Serialize};

/// Small content type used across certificate tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub holder: String,
    pub seats: u32,
}

pub fn grant() -> Grant {
    Grant {
        holder: "ACME Corp".into(),
        seats: 5,
    }
}

/// Canonical encoding via compact JSON.
pub struct JsonCodec;

impl ContentCodec<Grant> for JsonCodec {
    fn encode(&self, content: &Grant) -> Result<String, BoxError> {
        Ok(serde_json::to_string(content)?)
    }

    fn decode(&self, encoded: &str) -> Result<Grant, BoxError> {
        Ok(serde_json::from_str(encoded)?)
    }
}

/// Codec whose encoder always fails.
pub struct BrokenCodec;

impl ContentCodec<Grant> for BrokenCodec {
    fn encode(&self, _content: &Grant) -> Result<String, BoxError> {
        Err("encoder exploded".into())
    }

    fn decode(&self, _encoded: &str) -> Result<Grant, BoxError> {
        Err("decoder exploded".into())
    }
}

/// In-memory Ed25519 provider keyed by alias.
pub struct MemoryProvider {
    keys: HashMap<String, SigningKey>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        let mut keys = HashMap::new();
        keys.insert("issuer".to_string(), SigningKey::from_bytes(&[7u8; 32]));
        keys.insert("other".to_string(), SigningKey::from_bytes(&[9u8; 32]));
        Self { keys }
    }

    fn key(&self, alias: &str) -> Result<&SigningKey, BoxError> {
        self.keys
            .get(alias)
            .ok_or_else(|| format!("no key for alias {alias}").into())
    }
}

impl CryptoProvider for MemoryProvider {
    fn algorithm(&self) -> &str {
        "Ed25519"
    }

    fn sign(&self, message: &[u8], key: &PrivateKeyRef) -> Result<Vec<u8>, BoxError> {
        Ok(self.key(key.alias())?.sign(message).to_bytes().to_vec())
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &PublicKeyRef,
    ) -> Result<bool, BoxError> {
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(self
            .key(key.alias())?
            .verifying_key()
            .verify(message, &signature)
            .is_ok())
    }
}

pub fn private_ref(alias: &str) -> PrivateKeyRef {
    PrivateKeyRef::new(public_ref(alias), Passphrase::new("key-pw"))
}

pub fn public_ref(alias: &str) -> PublicKeyRef {
    PublicKeyRef::new("memory", alias, Passphrase::new("store-pw"))
}
