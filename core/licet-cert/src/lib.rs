//! Lock-protected certificates.
//!
//! A [`Certificate`] wraps a content value and decides when that content
//! may be read or changed:
//!
//! - While **unlocked**, content can be set but not read.
//! - [`Certificate::lock_for_issuance`] signs the canonical encoding of the
//!   content and locks the certificate for good.
//! - [`Certificate::lock_for_verification`] checks a claimed signature over
//!   raw encoded bytes and, only on a match, decodes and exposes the content.
//!
//! Nothing can leave a locked state, and nothing can read content that was
//! neither signed here nor verified here.
//!
//! Signing and verification go through the [`CryptoProvider`] seam; the
//! canonical encoding goes through a [`ContentCodec`]. Neither is
//! implemented in this crate.

mod certificate;
mod error;
mod provider;

pub use certificate::{Certificate, LockState, SealedCertificate, SIGNATURE_ENCODING};
pub use error::{BoxError, CertError, CertResult};
pub use provider::{ContentCodec, CryptoProvider, Passphrase, PrivateKeyRef, PublicKeyRef};
