#![allow(dead_code)]

use std::path::{Path, PathBuf};

use licet_cert::{Passphrase, PrivateKeyRef, PublicKeyRef};
use licet_keystore::{KdfParams, KeyStore, SigningKey};

pub const STORE_PASSPHRASE: &str = "store-secret";
pub const KEY_PASSPHRASE: &str = "key-secret";

/// Fast KDF params for testing (low memory/iterations for speed)
pub fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

/// A deterministic signing key, so signatures are reproducible.
pub fn seeded_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

/// Writes a store holding `issuer` (private) and returns its path and the
/// matching public-only store path.
pub fn write_stores(dir: &Path) -> (PathBuf, PathBuf) {
    let mut store = KeyStore::create(fast_kdf_params());
    store
        .import_signing_key("issuer", &seeded_key(7), &KEY_PASSPHRASE.into())
        .unwrap();
    let private_path = dir.join("issuer.keystore");
    store.save(&private_path, &STORE_PASSPHRASE.into()).unwrap();

    let public_path = dir.join("public.keystore");
    store
        .export_public_store()
        .save(&public_path, &STORE_PASSPHRASE.into())
        .unwrap();

    (private_path, public_path)
}

pub fn private_ref(store: &Path, alias: &str) -> PrivateKeyRef {
    PrivateKeyRef::new(public_ref(store, alias), Passphrase::from(KEY_PASSPHRASE))
}

pub fn public_ref(store: &Path, alias: &str) -> PublicKeyRef {
    PublicKeyRef::new(store, alias, Passphrase::from(STORE_PASSPHRASE))
}
