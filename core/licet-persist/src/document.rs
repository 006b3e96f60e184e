//! The versioned document envelope.

use serde::{Deserialize, Serialize};

use crate::Node;
use crate::error::DocumentError;

/// Format tag written into every document.
pub const DOCUMENT_FORMAT: &str = "licet-document";

/// Current document version. Documents of other versions are rejected.
pub const DOCUMENT_VERSION: u32 = 1;

/// Text encoding of every document.
pub const CHARSET: &str = "UTF-8";

/// Buffer size for document readers and writers (8 KiB).
pub const DEFAULT_BUFSIZE: usize = 8 * 1024;

/// Borrowing envelope used on the encode path.
#[derive(Serialize)]
pub(crate) struct EnvelopeRef<'a, T: ?Sized> {
    format: &'a str,
    version: u32,
    root: &'a T,
}

impl<'a, T: ?Sized> EnvelopeRef<'a, T> {
    pub(crate) fn new(root: &'a T) -> Self {
        Self {
            format: DOCUMENT_FORMAT,
            version: DOCUMENT_VERSION,
            root,
        }
    }
}

/// Owning envelope used on the decode path. The root stays a raw node until
/// the envelope has been checked.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Envelope {
    format: String,
    version: u32,
    root: Node,
}

impl Envelope {
    /// Checks format and version and hands out the root node.
    pub(crate) fn into_root(self) -> Result<Node, DocumentError> {
        if self.format != DOCUMENT_FORMAT {
            return Err(DocumentError::UnsupportedFormat(self.format));
        }
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(self.version));
        }
        Ok(self.root)
    }
}
