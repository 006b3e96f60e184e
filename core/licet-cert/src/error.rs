//! Error types for certificates.

use thiserror::Error;

/// Boxed cause carried by errors that originate in a collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for certificate operations.
pub type CertResult<T> = Result<T, CertError>;

/// Errors raised by the certificate state machine.
#[derive(Debug, Error)]
pub enum CertError {
    /// Content was modified or re-locked after the certificate was locked.
    #[error("certificate is already locked")]
    AlreadyLocked,

    /// Content was read before it was signed or verified.
    #[error("certificate is not locked")]
    NotLocked,

    /// Issuance was attempted without content.
    #[error("certificate has no content")]
    NoContent,

    /// Signature mismatch or corrupted signed data.
    #[error("certificate integrity check failed: {0}")]
    Integrity(String),

    /// The content codec could not produce the canonical encoding.
    #[error("content encoding failed: {0}")]
    Encode(#[source] BoxError),

    /// The crypto provider failed (key material unavailable, etc).
    #[error("crypto provider failed: {0}")]
    Crypto(#[source] BoxError),
}
