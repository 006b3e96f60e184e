//! The registry in effect for the codec call running on this thread.
//!
//! `serde` gives `Serialize`/`Deserialize` impls no way to receive context, so
//! the codec publishes its registry in a thread-local frame for the duration
//! of one call. `Opaque` reads the frame to find its delegate and leaves any
//! delegate failure in the frame so the codec can report it as the cause
//! instead of serde's flattened message.

use std::cell::RefCell;
use std::sync::Arc;

use crate::Node;
use crate::delegate::{DelegateRegistry, Opaque};
use crate::error::{BoxError, DelegateError};

struct Frame {
    registry: Arc<DelegateRegistry>,
    cause: Option<BoxError>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a frame active; pops it on drop, including during unwinding.
pub(crate) struct Scope {
    _not_send: std::marker::PhantomData<*const ()>,
}

pub(crate) fn enter(registry: Arc<DelegateRegistry>) -> Scope {
    FRAMES.with(|frames| {
        frames.borrow_mut().push(Frame {
            registry,
            cause: None,
        });
    });
    Scope {
        _not_send: std::marker::PhantomData,
    }
}

impl Scope {
    /// Takes the first delegate failure recorded in this frame.
    pub(crate) fn take_cause(&self) -> Option<BoxError> {
        FRAMES.with(|frames| {
            frames
                .borrow_mut()
                .last_mut()
                .and_then(|frame| frame.cause.take())
        })
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Runs `f` against the active registry. A failure is recorded as the frame's
/// cause (first one wins) and returned to serde as a message.
///
/// The frame is not borrowed while `f` runs, so a delegate may itself call
/// into a codec.
fn with_registry<R>(
    f: impl FnOnce(&DelegateRegistry) -> Result<R, DelegateError>,
) -> Result<R, String> {
    let registry = FRAMES.with(|frames| {
        frames
            .borrow()
            .last()
            .map(|frame| Arc::clone(&frame.registry))
    });
    let Some(registry) = registry else {
        return Err(DelegateError::OutsideCodec.to_string());
    };

    f(&registry).map_err(|err| {
        let message = err.to_string();
        FRAMES.with(|frames| {
            if let Some(frame) = frames.borrow_mut().last_mut() {
                frame.cause.get_or_insert(Box::new(err));
            }
        });
        message
    })
}

/// Encodes an opaque value with the delegate registered for its type.
/// Returns the delegate tag and the encoded node.
pub(crate) fn encode_opaque(value: &Opaque) -> Result<(String, Node), String> {
    with_registry(|registry| {
        let registered =
            registry
                .by_type(value.value_type_id())
                .ok_or(DelegateError::NoDelegate {
                    type_name: value.type_name(),
                })?;
        let node = registered
            .delegate
            .encode_any(value.value())
            .map_err(|source| DelegateError::Failed {
                tag: registered.tag.clone(),
                source,
            })?;
        Ok((registered.tag.clone(), node))
    })
}

/// Decodes a node with the delegate registered under `tag`.
pub(crate) fn decode_opaque(tag: &str, node: &Node) -> Result<Opaque, String> {
    with_registry(|registry| {
        let registered = registry
            .by_tag(tag)
            .ok_or_else(|| DelegateError::UnknownTag(tag.to_string()))?;
        registered
            .delegate
            .decode_any(node)
            .map_err(|source| DelegateError::Failed {
                tag: registered.tag.clone(),
                source,
            })
    })
}
