//! Ed25519 key pairs held by the store.

use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;

use crate::error::{KeyStoreError, KeyStoreResult};

/// Length of a raw Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Ed25519 signing key (secret). Zeroized on drop.
pub struct SigningKey(DalekSigningKey);

/// Ed25519 verifying key (public).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey(DalekVerifyingKey);

/// A keypair for signing and verification.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generates a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing = DalekSigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self {
            signing_key: SigningKey(signing),
            verifying_key: VerifyingKey(verifying),
        }
    }
}

impl SigningKey {
    /// Creates a signing key from a raw 32-byte seed.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(bytes))
    }

    /// Returns the raw 32-byte seed.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Signs a message and returns the raw signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.0.sign(message).to_bytes()
    }

    /// Returns the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningKey").field(&"[REDACTED]").finish()
    }
}

impl VerifyingKey {
    /// Creates a verifying key from a raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> KeyStoreResult<Self> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| KeyStoreError::InvalidKey(e.to_string()))
    }

    /// Creates a verifying key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> KeyStoreResult<Self> {
        let bytes: &[u8; 32] = bytes.try_into().map_err(|_| {
            KeyStoreError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Returns the raw 32-byte public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Returns true if `signature` is a valid signature of `message`.
    /// Signatures of the wrong length are simply invalid.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match DalekSignature::from_slice(signature) {
            Ok(signature) => self.0.verify(message, &signature).is_ok(),
            Err(_) => false,
        }
    }
}
