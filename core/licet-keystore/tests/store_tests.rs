mod common;

use std::fs;

use common::{KEY_PASSPHRASE, STORE_PASSPHRASE, fast_kdf_params, seeded_key};
use licet_cert::Passphrase;
use licet_keystore::{KeyStore, KeyStoreError, STORE_FORMAT};
use pretty_assertions::assert_eq;

fn pw(text: &str) -> Passphrase {
    Passphrase::from(text)
}

// ── In-memory operations ─────────────────────────────────────────

#[test]
fn generated_key_pair_signs_and_verifies() {
    let mut store = KeyStore::create(fast_kdf_params());
    let public = store.generate_key_pair("issuer", &pw(KEY_PASSPHRASE)).unwrap();

    let signing = store.signing_key("issuer", &pw(KEY_PASSPHRASE)).unwrap();
    let signature = signing.sign(b"license body");

    assert!(public.verify(b"license body", &signature));
    assert_eq!(store.verifying_key("issuer").unwrap(), public);
}

#[test]
fn aliases_are_sorted_and_unique() {
    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("zeta", &pw("a")).unwrap();
    store.generate_key_pair("alpha", &pw("b")).unwrap();

    assert_eq!(store.aliases().collect::<Vec<_>>(), vec!["alpha", "zeta"]);

    let err = store.generate_key_pair("alpha", &pw("c")).unwrap_err();
    assert!(matches!(err, KeyStoreError::AliasExists(a) if a == "alpha"));
}

#[test]
fn wrong_key_passphrase_fails_decryption() {
    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("issuer", &pw(KEY_PASSPHRASE)).unwrap();

    let err = store.signing_key("issuer", &pw("guess")).unwrap_err();
    assert!(matches!(err, KeyStoreError::Decryption(_)));
}

#[test]
fn unknown_alias_is_reported() {
    let store = KeyStore::create(fast_kdf_params());
    assert!(matches!(
        store.verifying_key("nobody").unwrap_err(),
        KeyStoreError::AliasNotFound(a) if a == "nobody"
    ));
    assert!(matches!(
        store.signing_key("nobody", &pw("x")).unwrap_err(),
        KeyStoreError::AliasNotFound(_)
    ));
}

#[test]
fn public_entries_have_no_private_key() {
    let mut store = KeyStore::create(fast_kdf_params());
    let bytes = seeded_key(3).verifying_key().to_bytes();
    store.insert_public("peer", &bytes).unwrap();

    assert!(store.contains_alias("peer"));
    assert!(!store.has_private_key("peer"));
    assert!(matches!(
        store.signing_key("peer", &pw("x")).unwrap_err(),
        KeyStoreError::NoPrivateKey(_)
    ));
}

#[test]
fn malformed_public_key_is_rejected() {
    let mut store = KeyStore::create(fast_kdf_params());
    let err = store.insert_public("peer", &[0u8; 5]).unwrap_err();
    assert!(matches!(err, KeyStoreError::InvalidKey(_)));
    assert!(!store.contains_alias("peer"));
}

#[test]
fn export_strips_private_keys() {
    let mut store = KeyStore::create(fast_kdf_params());
    let public = store
        .import_signing_key("issuer", &seeded_key(7), &pw(KEY_PASSPHRASE))
        .unwrap();

    let exported = store.export_public_store();

    assert!(store.has_private_key("issuer"));
    assert!(!exported.has_private_key("issuer"));
    assert_eq!(exported.verifying_key("issuer").unwrap(), public);
}

#[test]
fn remove_drops_the_entry() {
    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("issuer", &pw("k")).unwrap();
    assert!(store.remove("issuer"));
    assert!(!store.remove("issuer"));
    assert!(!store.contains_alias("issuer"));
}

#[test]
fn debug_lists_aliases_only() {
    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("issuer", &pw("k")).unwrap();
    let text = format!("{store:?}");
    assert!(text.contains("issuer"));
    assert!(!text.contains("seed"));
}

// ── Files ────────────────────────────────────────────────────────

#[test]
fn save_and_open_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.store");

    let mut store = KeyStore::create(fast_kdf_params());
    let public = store
        .import_signing_key("issuer", &seeded_key(7), &pw(KEY_PASSPHRASE))
        .unwrap();
    store.save(&path, &pw(STORE_PASSPHRASE)).unwrap();

    let reopened = KeyStore::open(&path, &pw(STORE_PASSPHRASE)).unwrap();
    assert_eq!(reopened.kdf_params(), &fast_kdf_params());
    assert_eq!(reopened.verifying_key("issuer").unwrap(), public);
    let signing = reopened.signing_key("issuer", &pw(KEY_PASSPHRASE)).unwrap();
    assert_eq!(signing.to_bytes(), seeded_key(7).to_bytes());
}

#[test]
fn file_hides_aliases_and_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.store");

    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("very-secret-alias", &pw("k")).unwrap();
    store.save(&path, &pw(STORE_PASSPHRASE)).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(STORE_FORMAT));
    assert!(!text.contains("very-secret-alias"));
}

#[test]
fn wrong_store_passphrase_fails_decryption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.store");
    KeyStore::create(fast_kdf_params())
        .save(&path, &pw(STORE_PASSPHRASE))
        .unwrap();

    let err = KeyStore::open(&path, &pw("not it")).unwrap_err();
    assert!(matches!(err, KeyStoreError::Decryption(_)));
}

#[test]
fn missing_store_is_an_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let err = KeyStore::open(dir.path().join("absent.store"), &pw("x")).unwrap_err();
    assert!(matches!(err, KeyStoreError::Persist(ref e) if e.is_io()));
}

#[test]
fn foreign_document_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.store");
    let mut store = KeyStore::create(fast_kdf_params());
    store.generate_key_pair("issuer", &pw("k")).unwrap();
    store.save(&path, &pw(STORE_PASSPHRASE)).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace(STORE_FORMAT, "other-keystore")).unwrap();

    let err = KeyStore::open(&path, &pw(STORE_PASSPHRASE)).unwrap_err();
    assert!(matches!(err, KeyStoreError::Unsupported(_)));
}

#[test]
fn resave_replaces_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keys.store");
    let mut store = KeyStore::create(fast_kdf_params());
    store.save(&path, &pw(STORE_PASSPHRASE)).unwrap();

    store.generate_key_pair("later", &pw("k")).unwrap();
    store.save(&path, &pw(STORE_PASSPHRASE)).unwrap();

    let reopened = KeyStore::open(&path, &pw(STORE_PASSPHRASE)).unwrap();
    assert!(reopened.contains_alias("later"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn concurrent_saves_to_one_path_leave_a_readable_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = std::sync::Arc::new(dir.path().join("shared.keystore"));

    let handles: Vec<_> = (0..4u8)
        .map(|seed| {
            let path = std::sync::Arc::clone(&path);
            std::thread::spawn(move || {
                let mut store = KeyStore::create(fast_kdf_params());
                store
                    .import_signing_key("issuer", &seeded_key(seed), &pw(KEY_PASSPHRASE))
                    .unwrap();
                for _ in 0..3 {
                    store.save(path.as_path(), &pw(STORE_PASSPHRASE)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = KeyStore::open(path.as_path(), &pw(STORE_PASSPHRASE)).unwrap();
    assert!(store.contains_alias("issuer"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
