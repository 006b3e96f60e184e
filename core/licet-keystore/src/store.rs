//! The key store file.
//!
//! A store is a map of aliases to entries. Every entry carries an Ed25519
//! public key; entries created by [`KeyStore::generate_key_pair`] or
//! [`KeyStore::import_signing_key`] also carry the private seed, encrypted
//! under a key derived from that entry's own passphrase. On disk the whole
//! entry table is encrypted again under a key derived from the store
//! passphrase, and the result is written transactionally by a
//! [`licet_persist::Codec`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use licet_cert::Passphrase;
use licet_persist::Codec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::cipher::{EncryptedData, decrypt, encrypt};
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::kdf::{KdfParams, Salt, derive_key};
use crate::signing::{KeyPair, SigningKey, VerifyingKey};

/// Format tag of the store file's root.
pub const STORE_FORMAT: &str = "licet-keystore";

/// Current store file version.
pub const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreFile {
    format: String,
    version: u32,
    kdf: KdfParams,
    salt: Salt,
    entries: EncryptedData,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<SealedSeed>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SealedSeed {
    salt: Salt,
    seed: EncryptedData,
}

/// An in-memory, decrypted view of a key store.
#[derive(Clone)]
pub struct KeyStore {
    kdf: KdfParams,
    entries: BTreeMap<String, Entry>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("kdf", &self.kdf)
            .field("aliases", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeyStore {
    /// Creates an empty store whose passphrases are stretched with `kdf`.
    pub fn create(kdf: KdfParams) -> Self {
        Self {
            kdf,
            entries: BTreeMap::new(),
        }
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    /// Aliases in sorted order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Returns true if `alias` holds a private key.
    pub fn has_private_key(&self, alias: &str) -> bool {
        self.entries
            .get(alias)
            .is_some_and(|entry| entry.private_key.is_some())
    }

    /// Generates a fresh key pair under `alias`, protecting the private half
    /// with `key_passphrase`.
    pub fn generate_key_pair(
        &mut self,
        alias: &str,
        key_passphrase: &Passphrase,
    ) -> KeyStoreResult<VerifyingKey> {
        let pair = KeyPair::generate();
        self.import_signing_key(alias, &pair.signing_key, key_passphrase)
    }

    /// Stores an existing signing key under `alias`.
    pub fn import_signing_key(
        &mut self,
        alias: &str,
        signing_key: &SigningKey,
        key_passphrase: &Passphrase,
    ) -> KeyStoreResult<VerifyingKey> {
        self.ensure_free(alias)?;

        let salt = Salt::random();
        let key = derive_key(key_passphrase, &salt, &self.kdf)?;
        let seed = Zeroizing::new(signing_key.to_bytes());
        let sealed = SealedSeed {
            salt,
            seed: encrypt(&key, &seed[..])?,
        };

        let verifying_key = signing_key.verifying_key();
        self.entries.insert(
            alias.to_string(),
            Entry {
                public_key: STANDARD.encode(verifying_key.to_bytes()),
                private_key: Some(sealed),
            },
        );
        debug!(alias, "stored key pair");
        Ok(verifying_key)
    }

    /// Stores a bare public key under `alias`.
    pub fn insert_public(&mut self, alias: &str, public_key: &[u8]) -> KeyStoreResult<VerifyingKey> {
        self.ensure_free(alias)?;
        let verifying_key = VerifyingKey::from_slice(public_key)?;
        self.entries.insert(
            alias.to_string(),
            Entry {
                public_key: STANDARD.encode(verifying_key.to_bytes()),
                private_key: None,
            },
        );
        debug!(alias, "stored public key");
        Ok(verifying_key)
    }

    /// Removes `alias`. Returns false if it was not present.
    pub fn remove(&mut self, alias: &str) -> bool {
        self.entries.remove(alias).is_some()
    }

    /// Returns a copy of this store with every private key stripped, for
    /// distribution to verifiers.
    pub fn export_public_store(&self) -> KeyStore {
        let entries = self
            .entries
            .iter()
            .map(|(alias, entry)| {
                (
                    alias.clone(),
                    Entry {
                        public_key: entry.public_key.clone(),
                        private_key: None,
                    },
                )
            })
            .collect();
        Self {
            kdf: self.kdf.clone(),
            entries,
        }
    }

    /// Decrypts the private key stored under `alias`.
    ///
    /// # Errors
    ///
    /// `AliasNotFound`, `NoPrivateKey` for public-only entries, and
    /// `Decryption` for a wrong key passphrase.
    pub fn signing_key(&self, alias: &str, key_passphrase: &Passphrase) -> KeyStoreResult<SigningKey> {
        let entry = self.entry(alias)?;
        let sealed = entry
            .private_key
            .as_ref()
            .ok_or_else(|| KeyStoreError::NoPrivateKey(alias.to_string()))?;

        let key = derive_key(key_passphrase, &sealed.salt, &self.kdf)?;
        let seed = Zeroizing::new(decrypt(&key, &sealed.seed)?);
        let seed: &[u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| KeyStoreError::InvalidKey(format!("bad seed length for {alias:?}")))?;

        let signing_key = SigningKey::from_bytes(seed);
        if signing_key.verifying_key() != entry.verifying_key()? {
            return Err(KeyStoreError::InvalidKey(format!(
                "private key for {alias:?} does not match its public key"
            )));
        }
        Ok(signing_key)
    }

    /// Returns the public key stored under `alias`.
    pub fn verifying_key(&self, alias: &str) -> KeyStoreResult<VerifyingKey> {
        self.entry(alias)?.verifying_key()
    }

    /// Encrypts the store under `store_passphrase` and writes it to `path`.
    /// An existing file is replaced atomically.
    pub fn save(&self, path: impl AsRef<Path>, store_passphrase: &Passphrase) -> KeyStoreResult<()> {
        let path = path.as_ref();
        let salt = Salt::random();
        let key = derive_key(store_passphrase, &salt, &self.kdf)?;
        let table = Zeroizing::new(serde_json::to_vec(&self.entries)?);

        let file = StoreFile {
            format: STORE_FORMAT.to_string(),
            version: STORE_VERSION,
            kdf: self.kdf.clone(),
            salt,
            entries: encrypt(&key, &table)?,
        };
        Codec::new().encode_to_file(&file, path)?;
        info!(path = %path.display(), entries = self.entries.len(), "key store saved");
        Ok(())
    }

    /// Reads and decrypts the store at `path`.
    ///
    /// # Errors
    ///
    /// `Persist` if the file cannot be read or is not a document,
    /// `Unsupported` for a foreign format or version, and `Decryption` for a
    /// wrong store passphrase.
    pub fn open(path: impl AsRef<Path>, store_passphrase: &Passphrase) -> KeyStoreResult<Self> {
        let path = path.as_ref();
        let file: StoreFile = Codec::new().decode_from_file(path)?;
        if file.format != STORE_FORMAT {
            return Err(KeyStoreError::Unsupported(format!("format {:?}", file.format)));
        }
        if file.version != STORE_VERSION {
            return Err(KeyStoreError::Unsupported(format!("version {}", file.version)));
        }

        let key = derive_key(store_passphrase, &file.salt, &file.kdf)?;
        let table = Zeroizing::new(decrypt(&key, &file.entries)?);
        let entries = serde_json::from_slice(&table)?;
        debug!(path = %path.display(), "key store opened");
        Ok(Self {
            kdf: file.kdf,
            entries,
        })
    }

    fn entry(&self, alias: &str) -> KeyStoreResult<&Entry> {
        self.entries
            .get(alias)
            .ok_or_else(|| KeyStoreError::AliasNotFound(alias.to_string()))
    }

    fn ensure_free(&self, alias: &str) -> KeyStoreResult<()> {
        if self.entries.contains_key(alias) {
            return Err(KeyStoreError::AliasExists(alias.to_string()));
        }
        Ok(())
    }
}

impl Entry {
    fn verifying_key(&self) -> KeyStoreResult<VerifyingKey> {
        let bytes = STANDARD
            .decode(&self.public_key)
            .map_err(|e| KeyStoreError::InvalidKey(e.to_string()))?;
        VerifyingKey::from_slice(&bytes)
    }
}
