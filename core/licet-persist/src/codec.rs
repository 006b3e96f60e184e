//! The codec: encode/decode entry points and their error boundary.

use std::any::{Any, TypeId};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::delegate::{Delegate, DelegateRegistry};
use crate::document::{DEFAULT_BUFSIZE, Envelope, EnvelopeRef};
use crate::error::{BoxError, PanicError, PersistError, PersistResult};
use crate::scope;
use crate::transaction::{self, PATH_LOCKS};

#[derive(Clone, Copy)]
enum Stage {
    Encode,
    Decode,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Decode => "decode",
        }
    }

    fn wrap(self, cause: BoxError) -> PersistError {
        match self {
            Self::Encode => PersistError::Encode(cause),
            Self::Decode => PersistError::Decode(cause),
        }
    }
}

/// Encodes object graphs to versioned documents and decodes them back.
///
/// A codec owns its delegate registry. Register delegates first, then share
/// the codec (typically behind an `Arc`); `register_delegate` needs `&mut`, so
/// a shared codec's registry cannot change under in-flight calls.
pub struct Codec {
    registry: Arc<DelegateRegistry>,
    buffer_size: usize,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("delegates", &self.registry.len())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

impl Codec {
    /// Creates a codec with no delegates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(DelegateRegistry::default()),
            buffer_size: DEFAULT_BUFSIZE,
        }
    }

    /// Overrides the reader/writer buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Registers `delegate` for values of type `T`, written under `tag`.
    ///
    /// The last registration wins: re-registering `T` replaces its delegate
    /// and tag, and reusing a tag unregisters the type that held it.
    pub fn register_delegate<T, D>(&mut self, tag: impl Into<String>, delegate: D) -> &mut Self
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
        D: Delegate<T>,
    {
        let tag = tag.into();
        debug!(%tag, type_name = std::any::type_name::<T>(), "registering delegate");
        Arc::make_mut(&mut self.registry).register::<T, D>(tag, delegate);
        self
    }

    /// Returns the tag of the delegate registered for `T`, if any.
    #[must_use]
    pub fn delegate_tag<T: Any>(&self) -> Option<&str> {
        self.registry.tag_of(TypeId::of::<T>())
    }

    /// Encodes `root` and writes the document to `writer`.
    ///
    /// The document is rendered completely in memory before the first byte is
    /// written. `writer` is consumed and dropped on every path.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] for any failure, cause attached.
    pub fn encode_to_writer<T, W>(&self, root: &T, writer: W) -> PersistResult<()>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        let mut out = BufWriter::with_capacity(self.buffer_size, writer);
        self.guarded(Stage::Encode, || {
            let text = self.render(root)?;
            out.write_all(text.as_bytes())
                .and_then(|()| out.flush())
                .map_err(|e| PersistError::Encode(Box::new(e)))
        })
    }

    /// Encodes `root` to document bytes.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] for any failure, cause attached.
    pub fn encode_to_bytes<T: Serialize + ?Sized>(&self, root: &T) -> PersistResult<Vec<u8>> {
        self.encode_to_string(root).map(String::into_bytes)
    }

    /// Encodes `root` to document text.
    ///
    /// # Errors
    ///
    /// [`PersistError::Encode`] for any failure, cause attached.
    pub fn encode_to_string<T: Serialize + ?Sized>(&self, root: &T) -> PersistResult<String> {
        self.guarded(Stage::Encode, || self.render(root))
    }

    /// Transactionally replaces the file at `path` with the encoded `root`.
    ///
    /// Concurrent calls for the same path are serialized across every codec
    /// in the process.
    ///
    /// # Errors
    ///
    /// The encode failure after a successful rollback, or
    /// [`PersistError::Transaction`] if the file could not be moved aside or
    /// restored.
    pub fn encode_to_file<T, P>(&self, root: &T, path: P) -> PersistResult<()>
    where
        T: Serialize + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        PATH_LOCKS.with_lock(path, || {
            transaction::replace(path, |file| self.encode_to_writer(root, file))
        })?;
        debug!(path = %path.display(), "document written");
        Ok(())
    }

    /// Reads a complete document from `reader` and decodes it. Nothing is
    /// returned until the whole graph has been built. `reader` is consumed and
    /// dropped on every path.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] for any failure, cause attached.
    pub fn decode_from_reader<T, R>(&self, reader: R) -> PersistResult<T>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let mut input = BufReader::with_capacity(self.buffer_size, reader);
        self.guarded(Stage::Decode, move || {
            let mut bytes = Vec::new();
            input
                .read_to_end(&mut bytes)
                .map_err(|e| PersistError::Decode(Box::new(e)))?;
            drop(input);
            self.parse(&bytes)
        })
    }

    /// Decodes document bytes.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] for any failure, cause attached.
    pub fn decode_from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> PersistResult<T> {
        self.guarded(Stage::Decode, || self.parse(bytes))
    }

    /// Decodes document text.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] for any failure, cause attached.
    pub fn decode_from_str<T: DeserializeOwned>(&self, text: &str) -> PersistResult<T> {
        self.decode_from_bytes(text.as_bytes())
    }

    /// Reads and decodes the document at `path`.
    ///
    /// # Errors
    ///
    /// [`PersistError::Decode`] for any failure, cause attached;
    /// [`PersistError::is_io`] tells file-system failures apart.
    pub fn decode_from_file<T, P>(&self, path: P) -> PersistResult<T>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let file = File::open(path.as_ref()).map_err(|e| PersistError::Decode(Box::new(e)))?;
        self.decode_from_reader(file)
    }

    fn render<T: Serialize + ?Sized>(&self, root: &T) -> PersistResult<String> {
        let frame = scope::enter(Arc::clone(&self.registry));
        serde_json::to_string_pretty(&EnvelopeRef::new(root))
            .map_err(|e| PersistError::Encode(frame.take_cause().unwrap_or_else(|| e.into())))
    }

    fn parse<T: DeserializeOwned>(&self, bytes: &[u8]) -> PersistResult<T> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| PersistError::Decode(Box::new(e)))?;
        let root = envelope
            .into_root()
            .map_err(|e| PersistError::Decode(Box::new(e)))?;

        let frame = scope::enter(Arc::clone(&self.registry));
        T::deserialize(root)
            .map_err(|e| PersistError::Decode(frame.take_cause().unwrap_or_else(|| e.into())))
    }

    /// The error boundary: typed failures pass through untouched, panics
    /// become the stage's error with a [`PanicError`] cause.
    fn guarded<R>(&self, stage: Stage, op: impl FnOnce() -> PersistResult<R>) -> PersistResult<R> {
        match panic::catch_unwind(AssertUnwindSafe(op)) {
            Ok(result) => result,
            Err(payload) => {
                let cause = PanicError::from_payload(stage.name(), payload);
                warn!(stage = stage.name(), panic = cause.message(), "codec call panicked");
                Err(stage.wrap(Box::new(cause)))
            }
        }
    }
}
