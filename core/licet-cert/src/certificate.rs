//! The certificate lock state machine.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CertError, CertResult};
use crate::provider::{ContentCodec, CryptoProvider, PrivateKeyRef, PublicKeyRef};

/// Text encoding applied to signature bytes in a [`SealedCertificate`].
pub const SIGNATURE_ENCODING: &str = "base64";

/// Lock state of a [`Certificate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockState {
    /// Content may be set but not read.
    Unlocked,
    /// Content was signed by the issuer. Terminal.
    LockedSigned,
    /// Content was verified by the consumer. Terminal.
    LockedVerified,
}

impl LockState {
    #[must_use]
    pub fn is_locked(self) -> bool {
        !matches!(self, Self::Unlocked)
    }
}

/// The persistable form of a certificate: the signed encoding and the
/// signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealedCertificate {
    /// Canonical encoding of the content. The signature covers its UTF-8 bytes.
    pub encoded: String,
    /// Signature bytes, encoded per `signature_encoding`.
    pub signature: String,
    pub signature_algorithm: String,
    pub signature_encoding: String,
}

/// Signed, lock-protected content.
///
/// See the crate docs for the state machine. A certificate is created per
/// issuance or per verification attempt and is not reused.
#[derive(Debug)]
pub struct Certificate<C> {
    state: LockState,
    content: Option<C>,
    encoded: Option<String>,
    signature: Option<String>,
    algorithm: Option<String>,
    signature_encoding: Option<String>,
}

impl<C> Default for Certificate<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Certificate<C> {
    /// Creates an empty, unlocked certificate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LockState::Unlocked,
            content: None,
            encoded: None,
            signature: None,
            algorithm: None,
            signature_encoding: None,
        }
    }

    /// Creates an unlocked candidate from a persisted certificate. Its content
    /// stays unreadable until [`lock_for_verification`](Self::lock_for_verification)
    /// succeeds.
    #[must_use]
    pub fn from_sealed(sealed: SealedCertificate) -> Self {
        Self {
            state: LockState::Unlocked,
            content: None,
            encoded: Some(sealed.encoded),
            signature: Some(sealed.signature),
            algorithm: Some(sealed.signature_algorithm),
            signature_encoding: Some(sealed.signature_encoding),
        }
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    /// Sets the content to be signed.
    ///
    /// # Errors
    ///
    /// [`CertError::AlreadyLocked`] once the certificate is locked.
    pub fn set_content(&mut self, content: C) -> CertResult<()> {
        self.ensure_unlocked()?;
        self.content = Some(content);
        Ok(())
    }

    /// Returns the content.
    ///
    /// # Errors
    ///
    /// [`CertError::NotLocked`] unless the certificate was signed or verified.
    pub fn content(&self) -> CertResult<&C> {
        if !self.is_locked() {
            return Err(CertError::NotLocked);
        }
        self.content.as_ref().ok_or(CertError::NoContent)
    }

    /// Consumes the certificate and returns its content.
    ///
    /// # Errors
    ///
    /// Same as [`content`](Self::content).
    pub fn into_content(self) -> CertResult<C> {
        if !self.is_locked() {
            return Err(CertError::NotLocked);
        }
        self.content.ok_or(CertError::NoContent)
    }

    /// The signature in its text encoding, if one has been computed or loaded.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    /// Returns the persistable form of a locked certificate.
    ///
    /// # Errors
    ///
    /// [`CertError::NotLocked`] while unlocked.
    pub fn sealed(&self) -> CertResult<SealedCertificate> {
        if !self.is_locked() {
            return Err(CertError::NotLocked);
        }
        match (
            &self.encoded,
            &self.signature,
            &self.algorithm,
            &self.signature_encoding,
        ) {
            (Some(encoded), Some(signature), Some(algorithm), Some(encoding)) => {
                Ok(SealedCertificate {
                    encoded: encoded.clone(),
                    signature: signature.clone(),
                    signature_algorithm: algorithm.clone(),
                    signature_encoding: encoding.clone(),
                })
            }
            _ => Err(CertError::NoContent),
        }
    }

    /// Signs the canonical encoding of the content and locks the certificate
    /// as issued.
    ///
    /// # Errors
    ///
    /// [`CertError::AlreadyLocked`] if locked, [`CertError::NoContent`] if no
    /// content was set, [`CertError::Encode`] or [`CertError::Crypto`] if a
    /// collaborator fails. On error the certificate stays unlocked.
    pub fn lock_for_issuance(
        &mut self,
        codec: &dyn ContentCodec<C>,
        crypto: &dyn CryptoProvider,
        key: &PrivateKeyRef,
    ) -> CertResult<()> {
        self.ensure_unlocked()?;
        let content = self.content.as_ref().ok_or(CertError::NoContent)?;

        let encoded = codec.encode(content).map_err(CertError::Encode)?;
        let signature = crypto
            .sign(encoded.as_bytes(), key)
            .map_err(CertError::Crypto)?;

        self.encoded = Some(encoded);
        self.signature = Some(BASE64.encode(signature));
        self.algorithm = Some(crypto.algorithm().to_string());
        self.signature_encoding = Some(SIGNATURE_ENCODING.to_string());
        self.state = LockState::LockedSigned;

        debug!(alias = key.alias(), algorithm = crypto.algorithm(), "certificate signed");
        Ok(())
    }

    /// Checks the claimed signature over the raw encoded content and, on a
    /// match, decodes the content and locks the certificate as verified.
    ///
    /// # Errors
    ///
    /// [`CertError::Integrity`] when the signature is missing, malformed,
    /// made with another algorithm, does not match, or the signed content does
    /// not decode. [`CertError::Crypto`] when the key material cannot be
    /// reached. On any error the certificate stays unlocked.
    pub fn lock_for_verification(
        &mut self,
        codec: &dyn ContentCodec<C>,
        crypto: &dyn CryptoProvider,
        key: &PublicKeyRef,
    ) -> CertResult<()> {
        self.ensure_unlocked()?;

        let (Some(encoded), Some(signature)) = (&self.encoded, &self.signature) else {
            return Err(CertError::Integrity("certificate carries no signature".into()));
        };

        let algorithm = self.algorithm.as_deref().unwrap_or_default();
        if algorithm != crypto.algorithm() {
            return Err(CertError::Integrity(format!(
                "signature algorithm {algorithm:?} does not match provider {:?}",
                crypto.algorithm()
            )));
        }
        let encoding = self.signature_encoding.as_deref().unwrap_or_default();
        if encoding != SIGNATURE_ENCODING {
            return Err(CertError::Integrity(format!(
                "unsupported signature encoding {encoding:?}"
            )));
        }

        let signature = BASE64
            .decode(signature)
            .map_err(|e| CertError::Integrity(format!("malformed signature: {e}")))?;

        let matches = crypto
            .verify(encoded.as_bytes(), &signature, key)
            .map_err(CertError::Crypto)?;
        if !matches {
            debug!(alias = key.alias(), "certificate signature mismatch");
            return Err(CertError::Integrity("signature does not match content".into()));
        }

        let content = codec
            .decode(encoded)
            .map_err(|e| CertError::Integrity(format!("signed content does not decode: {e}")))?;

        self.content = Some(content);
        self.state = LockState::LockedVerified;

        debug!(alias = key.alias(), "certificate verified");
        Ok(())
    }

    fn ensure_unlocked(&self) -> CertResult<()> {
        if self.is_locked() {
            Err(CertError::AlreadyLocked)
        } else {
            Ok(())
        }
    }
}
