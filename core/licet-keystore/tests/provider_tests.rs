mod common;

use common::{private_ref, public_ref, write_stores};
use licet_cert::CryptoProvider;
use licet_keystore::{ED25519, Ed25519Provider, KeyStoreError};

#[test]
fn algorithm_name() {
    assert_eq!(Ed25519Provider::new().algorithm(), ED25519);
}

#[test]
fn signature_verifies_against_public_store() {
    let dir = tempfile::tempdir().unwrap();
    let (private, public) = write_stores(dir.path());
    let provider = Ed25519Provider::new();

    let signature = provider.sign(b"payload", &private_ref(&private, "issuer")).unwrap();

    assert!(provider.verify(b"payload", &signature, &public_ref(&public, "issuer")).unwrap());
    assert!(!provider.verify(b"payl0ad", &signature, &public_ref(&public, "issuer")).unwrap());
}

#[test]
fn signatures_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let (private, _) = write_stores(dir.path());
    let provider = Ed25519Provider::new();
    let key = private_ref(&private, "issuer");

    assert_eq!(provider.sign(b"x", &key).unwrap(), provider.sign(b"x", &key).unwrap());
}

#[test]
fn malformed_signature_is_just_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let (_, public) = write_stores(dir.path());
    let valid = Ed25519Provider::new()
        .verify(b"payload", &[1, 2, 3], &public_ref(&public, "issuer"))
        .unwrap();
    assert!(!valid);
}

#[test]
fn public_store_cannot_sign() {
    let dir = tempfile::tempdir().unwrap();
    let (_, public) = write_stores(dir.path());

    let err = Ed25519Provider::new()
        .sign(b"payload", &private_ref(&public, "issuer"))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<KeyStoreError>(),
        Some(KeyStoreError::NoPrivateKey(_))
    ));
}

#[test]
fn unknown_alias_is_an_error_not_a_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let (_, public) = write_stores(dir.path());

    let err = Ed25519Provider::new()
        .verify(b"payload", &[0; 64], &public_ref(&public, "someone"))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<KeyStoreError>(),
        Some(KeyStoreError::AliasNotFound(_))
    ));
}
