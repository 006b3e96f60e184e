//! Caller-supplied parameters for one issue or verify call.
//!
//! Parameters can be built in code or loaded from a TOML file:
//!
//! ```toml
//! subject = "license"
//! key_store = "keys/public.keystore"
//! alias = "publiccert"
//! store_passphrase = "public_password1234"
//! license_path = "license.lic"
//! # key_passphrase = "..."   # issuance only
//! ```
//!
//! Relative paths in a file are resolved against the file's directory.

use std::path::{Path, PathBuf};

use licet_cert::{Passphrase, PrivateKeyRef, PublicKeyRef};
use serde::Deserialize;
use tracing::info;

use crate::error::{LicenseError, LicenseResult};

/// License file name used when a parameter file names none.
pub const DEFAULT_LICENSE_PATH: &str = "license.lic";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ParametersFile {
    subject: String,
    key_store: PathBuf,
    alias: String,
    store_passphrase: Passphrase,
    #[serde(default)]
    key_passphrase: Option<Passphrase>,
    #[serde(default = "default_license_path")]
    license_path: PathBuf,
}

fn default_license_path() -> PathBuf {
    PathBuf::from(DEFAULT_LICENSE_PATH)
}

/// Subject, key material locator and license file location.
///
/// Passphrases are wiped on drop and never printed by `Debug`.
#[derive(Debug, Clone)]
pub struct LicenseParameters {
    subject: String,
    key_store: PathBuf,
    alias: String,
    store_passphrase: Passphrase,
    key_passphrase: Option<Passphrase>,
    license_path: PathBuf,
}

impl LicenseParameters {
    pub fn new(
        subject: impl Into<String>,
        key_store: impl Into<PathBuf>,
        alias: impl Into<String>,
        store_passphrase: impl Into<Passphrase>,
        license_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            subject: subject.into(),
            key_store: key_store.into(),
            alias: alias.into(),
            store_passphrase: store_passphrase.into(),
            key_passphrase: None,
            license_path: license_path.into(),
        }
    }

    /// Adds the private key passphrase needed for issuance.
    #[must_use]
    pub fn with_key_passphrase(mut self, key_passphrase: impl Into<Passphrase>) -> Self {
        self.key_passphrase = Some(key_passphrase.into());
        self
    }

    /// Loads parameters from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LicenseError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut params = Self::from_toml_str(&contents)?;

        if let Some(base) = path.parent() {
            params.key_store = base.join(&params.key_store);
            params.license_path = base.join(&params.license_path);
        }
        info!(path = %path.display(), subject = %params.subject, "loaded license parameters");
        Ok(params)
    }

    /// Parses parameters from TOML text. Paths are kept as written.
    pub fn from_toml_str(contents: &str) -> LicenseResult<Self> {
        let file: ParametersFile =
            toml::from_str(contents).map_err(|e| LicenseError::Config(e.to_string()))?;
        if file.subject.trim().is_empty() {
            return Err(LicenseError::Config("subject must not be empty".into()));
        }
        if file.alias.trim().is_empty() {
            return Err(LicenseError::Config("alias must not be empty".into()));
        }
        Ok(Self {
            subject: file.subject,
            key_store: file.key_store,
            alias: file.alias,
            store_passphrase: file.store_passphrase,
            key_passphrase: file.key_passphrase,
            license_path: file.license_path,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn key_store(&self) -> &Path {
        &self.key_store
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn license_path(&self) -> &Path {
        &self.license_path
    }

    pub fn has_key_passphrase(&self) -> bool {
        self.key_passphrase.is_some()
    }

    /// Passphrase of the key store. It also seals the license file.
    pub(crate) fn store_passphrase(&self) -> &Passphrase {
        &self.store_passphrase
    }

    /// Reference to the verification key.
    pub fn public_key_ref(&self) -> PublicKeyRef {
        PublicKeyRef::new(
            self.key_store.clone(),
            self.alias.clone(),
            self.store_passphrase.clone(),
        )
    }

    /// Reference to the signing key.
    ///
    /// # Errors
    ///
    /// [`LicenseError::MissingKeyPassphrase`] if no key passphrase was given.
    pub fn private_key_ref(&self) -> LicenseResult<PrivateKeyRef> {
        let key_passphrase = self
            .key_passphrase
            .clone()
            .ok_or(LicenseError::MissingKeyPassphrase)?;
        Ok(PrivateKeyRef::new(self.public_key_ref(), key_passphrase))
    }
}
