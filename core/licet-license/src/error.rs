//! Error types for license issuance and verification.

use chrono::{DateTime, Utc};
use licet_cert::{BoxError, CertError};
use licet_persist::PersistError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Content was changed after the certificate was locked.
    #[error("certificate is already locked")]
    AlreadyLocked,

    /// Content was read before the certificate was locked.
    #[error("certificate is not locked")]
    NotLocked,

    /// The license file was tampered with, corrupted, or signed by another
    /// key.
    #[error("license integrity check failed: {0}")]
    Integrity(String),

    #[error("license expired on {not_after}")]
    Expired { not_after: DateTime<Utc> },

    #[error("license is not valid before {not_before}")]
    NotYetValid { not_before: DateTime<Utc> },

    /// The constraint payload was rejected by the checker, or could not be
    /// checked at all.
    #[error("license constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("license was issued for subject {found:?}, expected {expected:?}")]
    SubjectMismatch { expected: String, found: String },

    /// The content is not fit for issuance.
    #[error("invalid license content: {0}")]
    InvalidContent(String),

    /// Issuance needs a key passphrase and the parameters carry none.
    #[error("issuing a license requires a key passphrase")]
    MissingKeyPassphrase,

    /// Reading or writing the license file failed.
    #[error("license file error: {0}")]
    Persist(#[from] PersistError),

    /// The key material could not be reached.
    #[error("crypto provider failed: {0}")]
    Crypto(#[source] BoxError),

    /// The parameter file could not be loaded.
    #[error("invalid license parameters: {0}")]
    Config(String),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

impl LicenseError {
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }

    #[must_use]
    pub fn is_not_yet_valid(&self) -> bool {
        matches!(self, Self::NotYetValid { .. })
    }

    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }

    /// True for failures of the license file itself rather than its content.
    #[must_use]
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}

impl From<CertError> for LicenseError {
    fn from(err: CertError) -> Self {
        match err {
            CertError::AlreadyLocked => Self::AlreadyLocked,
            CertError::NotLocked => Self::NotLocked,
            CertError::NoContent => Self::InvalidContent("certificate has no content".into()),
            CertError::Integrity(reason) => Self::Integrity(reason),
            CertError::Encode(cause) => match cause.downcast::<PersistError>() {
                Ok(persist) => Self::Persist(*persist),
                Err(cause) => Self::Persist(PersistError::Encode(cause)),
            },
            CertError::Crypto(cause) => Self::Crypto(cause),
        }
    }
}
