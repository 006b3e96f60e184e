//! Issuing and verifying license files.

use std::fmt;
use std::sync::Arc;

use licet_cert::{BoxError, Certificate, ContentCodec, CryptoProvider};
use licet_keystore::{Ed25519Provider, KdfParams};
use licet_persist::{Codec, Opaque};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::constraint::ConstraintChecker;
use crate::content::LicenseContent;
use crate::error::{LicenseError, LicenseResult};
use crate::hardware::{HARDWARE_BINDING_TAG, HardwareBinding, HardwareBindingDelegate};
use crate::params::LicenseParameters;
use crate::sealed::LicenseFile;

/// Canonical content encoding: the content as a codec document.
struct DocumentContent<'a>(&'a Codec);

impl ContentCodec<LicenseContent> for DocumentContent<'_> {
    fn encode(&self, content: &LicenseContent) -> Result<String, BoxError> {
        Ok(self.0.encode_to_string(content)?)
    }

    fn decode(&self, encoded: &str) -> Result<LicenseContent, BoxError> {
        Ok(self.0.decode_from_str(encoded)?)
    }
}

/// Issues and verifies license files.
///
/// A manager is immutable once built and can be shared across threads.
pub struct LicenseManager {
    codec: Arc<Codec>,
    crypto: Arc<dyn CryptoProvider>,
    checker: Option<Arc<dyn ConstraintChecker>>,
    clock: Arc<dyn Clock>,
    kdf: KdfParams,
}

impl fmt::Debug for LicenseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseManager")
            .field("codec", &self.codec)
            .field("algorithm", &self.crypto.algorithm())
            .field("constraint_checker", &self.checker.is_some())
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl LicenseManager {
    pub fn builder() -> LicenseManagerBuilder {
        LicenseManagerBuilder::default()
    }

    /// The codec used for license files, with the hardware binding delegate
    /// registered.
    pub fn codec(&self) -> &Arc<Codec> {
        &self.codec
    }

    /// Signs `content` for `params.subject()` and writes the license file,
    /// encrypted under the store passphrase.
    ///
    /// The file at `params.license_path()` is replaced atomically; on any
    /// failure it keeps its previous content.
    ///
    /// # Errors
    ///
    /// `MissingKeyPassphrase`, `InvalidContent`, `Crypto` if the key cannot
    /// be used, `Persist` if the file cannot be written.
    pub fn issue(&self, params: &LicenseParameters, content: LicenseContent) -> LicenseResult<()> {
        let key = params.private_key_ref()?;
        let content = content.prepare_for_issue(params.subject(), self.clock.now())?;

        let mut certificate = Certificate::new();
        certificate.set_content(content)?;
        certificate.lock_for_issuance(&DocumentContent(&self.codec), self.crypto.as_ref(), &key)?;
        let sealed = certificate.sealed()?;
        let file = LicenseFile::seal(&self.codec, &sealed, params.store_passphrase(), &self.kdf)?;

        let path = params.license_path();
        self.codec.encode_to_file(&file, path)?;
        info!(
            subject = params.subject(),
            path = %path.display(),
            "license issued"
        );
        Ok(())
    }

    /// Reads, authenticates and checks the license file named by `params`.
    ///
    /// Checks run in a fixed order and stop at the first failure: signature
    /// integrity, subject, validity window, then the constraint payload.
    ///
    /// # Errors
    ///
    /// `Integrity` for a tampered, corrupted or foreign file; `Persist` for
    /// a missing or unreadable one; `SubjectMismatch`, `NotYetValid`,
    /// `Expired` or `ConstraintViolation` for authentic content that does
    /// not apply; `Crypto` if the key material cannot be reached.
    pub fn verify(&self, params: &LicenseParameters) -> LicenseResult<LicenseContent> {
        let path = params.license_path();
        let sealed = LicenseFile::read(&self.codec, path)
            .and_then(|file| file.open(&self.codec, params.store_passphrase()))
            .inspect_err(|e| warn!(path = %path.display(), error = %e, "license rejected"))?;

        let mut certificate = Certificate::from_sealed(sealed);
        let verified = certificate.lock_for_verification(
            &DocumentContent(&self.codec),
            self.crypto.as_ref(),
            &params.public_key_ref(),
        );
        if let Err(e) = verified {
            warn!(path = %path.display(), error = %e, "license rejected");
            return Err(e.into());
        }
        let content = certificate.into_content()?;

        if content.subject() != params.subject() {
            return Err(LicenseError::SubjectMismatch {
                expected: params.subject().to_string(),
                found: content.subject().to_string(),
            });
        }
        content.check_window(self.clock.now())?;
        if let Some(extra) = content.extra() {
            self.check_constraint(extra)?;
        }

        debug!(subject = content.subject(), not_after = %content.not_after(), "license verified");
        Ok(content)
    }

    fn check_constraint(&self, payload: &Opaque) -> LicenseResult<()> {
        let Some(checker) = &self.checker else {
            return Err(LicenseError::ConstraintViolation(format!(
                "no checker configured for {}",
                payload.type_name()
            )));
        };
        match checker.evaluate(payload) {
            Ok(true) => Ok(()),
            Ok(false) => Err(LicenseError::ConstraintViolation(format!(
                "{payload:?} does not match this host"
            ))),
            Err(reason) => Err(LicenseError::ConstraintViolation(reason.to_string())),
        }
    }
}

/// Wires the collaborators of a [`LicenseManager`].
///
/// Defaults: a fresh codec, [`Ed25519Provider`], no constraint checker, the
/// system clock and default [`KdfParams`] for sealing license files.
#[derive(Default)]
pub struct LicenseManagerBuilder {
    codec: Option<Codec>,
    crypto: Option<Arc<dyn CryptoProvider>>,
    checker: Option<Arc<dyn ConstraintChecker>>,
    clock: Option<Arc<dyn Clock>>,
    kdf: Option<KdfParams>,
}

impl LicenseManagerBuilder {
    /// Uses `codec` for license files. Delegates already registered on it
    /// stay in effect.
    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    #[must_use]
    pub fn crypto(mut self, crypto: impl CryptoProvider + 'static) -> Self {
        self.crypto = Some(Arc::new(crypto));
        self
    }

    #[must_use]
    pub fn constraint_checker(mut self, checker: impl ConstraintChecker + 'static) -> Self {
        self.checker = Some(Arc::new(checker));
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Key derivation cost for license files this manager issues. Verifying
    /// uses the parameters recorded in each file.
    #[must_use]
    pub fn license_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = Some(kdf);
        self
    }

    pub fn build(self) -> LicenseManager {
        let mut codec = self.codec.unwrap_or_default();
        codec.register_delegate::<HardwareBinding, _>(HARDWARE_BINDING_TAG, HardwareBindingDelegate);

        LicenseManager {
            codec: Arc::new(codec),
            crypto: self.crypto.unwrap_or_else(|| Arc::new(Ed25519Provider::new())),
            checker: self.checker,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            kdf: self.kdf.unwrap_or_default(),
        }
    }
}
