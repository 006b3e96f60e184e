//! Shared fixtures for license tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use licet_keystore::{KdfParams, KeyStore, SigningKey};
use licet_license::{
    FixedClock, HardwareBinding, LicenseContent, LicenseManager, LicenseParameters,
    MacAddressChecker, StaticAdapters, parse_timestamp,
};
use tempfile::TempDir;

pub const SUBJECT: &str = "license";
pub const PRIVATE_ALIAS: &str = "privatekey";
pub const PUBLIC_ALIAS: &str = "publiccert";
pub const PRIVATE_STORE_PASSPHRASE: &str = "public_password1234";
pub const KEY_PASSPHRASE: &str = "private_password1234";
pub const PUBLIC_STORE_PASSPHRASE: &str = "public_password1234";

pub const BOUND_MAC: &str = "E4-70-B8-DF-DC-1A";
pub const OTHER_MAC: &str = "00-1B-44-11-3A-B7";

/// Routes `tracing` output to the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ts(text: &str) -> DateTime<Utc> {
    parse_timestamp(text).unwrap()
}

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

/// A temp directory with an issuer store, a consumer store holding only the
/// matching public key, and room for the license file.
pub struct Fixture {
    pub dir: TempDir,
    pub private_store: PathBuf,
    pub public_store: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_seed(1)
    }

    /// Stores built from a deterministic key seed.
    pub fn with_seed(seed: u8) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let signing_key = SigningKey::from_bytes(&[seed; 32]);

        let mut private = KeyStore::create(fast_kdf_params());
        private
            .import_signing_key(PRIVATE_ALIAS, &signing_key, &KEY_PASSPHRASE.into())
            .unwrap();
        let private_store = dir.path().join("privateKeys.keystore");
        private
            .save(&private_store, &PRIVATE_STORE_PASSPHRASE.into())
            .unwrap();

        let mut public = KeyStore::create(fast_kdf_params());
        public
            .insert_public(PUBLIC_ALIAS, &signing_key.verifying_key().to_bytes())
            .unwrap();
        let public_store = dir.path().join("publicCerts.keystore");
        public
            .save(&public_store, &PUBLIC_STORE_PASSPHRASE.into())
            .unwrap();

        Self {
            dir,
            private_store,
            public_store,
        }
    }

    pub fn license_path(&self) -> PathBuf {
        self.dir.path().join("license.lic")
    }

    pub fn issue_params(&self) -> LicenseParameters {
        LicenseParameters::new(
            SUBJECT,
            &self.private_store,
            PRIVATE_ALIAS,
            PRIVATE_STORE_PASSPHRASE,
            self.license_path(),
        )
        .with_key_passphrase(KEY_PASSPHRASE)
    }

    pub fn verify_params(&self) -> LicenseParameters {
        LicenseParameters::new(
            SUBJECT,
            &self.public_store,
            PUBLIC_ALIAS,
            PUBLIC_STORE_PASSPHRASE,
            self.license_path(),
        )
    }
}

/// The reference license: one user seat, February 2018 to the end of 2020,
/// bound to [`BOUND_MAC`].
pub fn scenario_content() -> LicenseContent {
    LicenseContent::builder()
        .issued_at(ts("2018-01-01"))
        .not_before(ts("2018-02-01"))
        .not_after(ts("2020-12-31"))
        .consumer_type("user")
        .consumer_amount(1)
        .info("reference license")
        .extra(HardwareBinding::new([BOUND_MAC]).unwrap().into_opaque())
        .build()
        .unwrap()
}

/// Content with no constraint payload.
pub fn unbound_content() -> LicenseContent {
    LicenseContent::builder()
        .not_before(ts("2018-02-01"))
        .not_after(ts("2020-12-31"))
        .build()
        .unwrap()
}

/// A manager for the issuing side.
pub fn issuer() -> LicenseManager {
    LicenseManager::builder()
        .clock(FixedClock::at(ts("2018-01-01")))
        .license_kdf(fast_kdf_params())
        .build()
}

/// A verifying manager whose clock reads `now` and whose host has `macs`.
pub fn verifier_at(now: &str, macs: &[&str]) -> LicenseManager {
    LicenseManager::builder()
        .clock(FixedClock::at(ts(now)))
        .constraint_checker(MacAddressChecker::new(StaticAdapters::new(macs).unwrap()))
        .build()
}
