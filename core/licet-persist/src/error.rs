//! Error types for the persistence engine.

use std::any::Any;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed original cause of a persistence failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Errors surfaced by the [`Codec`](crate::Codec).
///
/// Every failure on the encode path is `Encode`, every failure on the decode
/// path is `Decode`; the cause is always attached. `Transaction` means a
/// transactional write could not put the file system back in a known state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("encoding failed: {0}")]
    Encode(#[source] BoxError),

    #[error("decoding failed: {0}")]
    Decode(#[source] BoxError),

    #[error("transactional write to {} left it in an unknown state: {source}", .path.display())]
    Transaction {
        path: PathBuf,
        #[source]
        source: io::Error,
        /// The failure that triggered the rollback, if any.
        original: Option<Box<PersistError>>,
    },
}

impl PersistError {
    /// Returns true if the cause is a file-system error rather than a problem
    /// with the document itself.
    #[must_use]
    pub fn is_io(&self) -> bool {
        match self {
            Self::Encode(cause) | Self::Decode(cause) => cause.is::<io::Error>(),
            Self::Transaction { .. } => true,
        }
    }

    /// Returns the original cause, if this error wraps one.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Encode(cause) | Self::Decode(cause) => Some(cause.as_ref()),
            Self::Transaction { .. } => None,
        }
    }
}

/// Failures raised while resolving or running a delegate.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// An [`Opaque`](crate::Opaque) value has no delegate for its type.
    #[error("no delegate registered for type {type_name}")]
    NoDelegate { type_name: &'static str },

    /// A document names a delegate tag this codec does not know.
    #[error("no delegate registered under tag {0:?}")]
    UnknownTag(String),

    /// An `Opaque` value was serialized by something other than a codec.
    #[error("opaque value handled outside of a codec call")]
    OutsideCodec,

    /// The delegate itself failed.
    #[error("delegate {tag:?} failed: {source}")]
    Failed {
        tag: String,
        #[source]
        source: BoxError,
    },
}

/// The document envelope is not one this codec reads.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document format {0:?}")]
    UnsupportedFormat(String),

    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),
}

/// A panic caught at the codec's error boundary.
#[derive(Debug, Error)]
#[error("panic during {stage}: {message}")]
pub struct PanicError {
    stage: &'static str,
    message: String,
}

impl PanicError {
    pub(crate) fn from_payload(stage: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { stage, message }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
