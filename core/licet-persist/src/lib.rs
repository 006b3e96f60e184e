//! Object-graph persistence for licet.
//!
//! A [`Codec`] turns any `serde` value into a versioned UTF-8 JSON document
//! and back. Values that `serde` cannot handle travel as [`Opaque`] and are
//! encoded by a [`Delegate`] registered with the codec for their type.
//!
//! # Failure model
//!
//! Every encode/decode call runs behind one error boundary: I/O errors,
//! malformed documents, delegate errors and even panics inside a delegate come
//! back as [`PersistError::Encode`] or [`PersistError::Decode`] with the
//! original cause attached. Writers and readers are consumed and released on
//! every exit path.
//!
//! [`Codec::encode_to_file`] is transactional: the target path always holds
//! either the previous complete document or the new complete document.
//!
//! # Registration
//!
//! Delegates are registered through `&mut Codec` before the codec is shared,
//! so the registry is read-only while encode/decode traffic is in flight.

mod codec;
mod delegate;
mod document;
mod error;
mod scope;
mod transaction;

pub use codec::Codec;
pub use delegate::{Delegate, FnDelegate, Opaque, delegate_fn};
pub use document::{CHARSET, DEFAULT_BUFSIZE, DOCUMENT_FORMAT, DOCUMENT_VERSION};
pub use error::{BoxError, DelegateError, DocumentError, PanicError, PersistError, PersistResult};

/// A node of the declarative document tree.
pub type Node = serde_json::Value;
