//! Per-type encode/decode delegates and the opaque values they handle.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Node;
use crate::error::BoxError;
use crate::scope;

/// Encode/decode strategy for one type the generic mechanism cannot handle.
pub trait Delegate<T>: Send + Sync + 'static {
    fn encode(&self, value: &T) -> Result<Node, BoxError>;

    fn decode(&self, node: &Node) -> Result<T, BoxError>;
}

/// A [`Delegate`] built from two closures.
pub struct FnDelegate<T, E, D> {
    encode: E,
    decode: D,
    _marker: PhantomData<fn() -> T>,
}

/// Builds a delegate from an encode and a decode closure.
pub fn delegate_fn<T, E, D>(encode: E, decode: D) -> FnDelegate<T, E, D>
where
    E: Fn(&T) -> Result<Node, BoxError> + Send + Sync + 'static,
    D: Fn(&Node) -> Result<T, BoxError> + Send + Sync + 'static,
{
    FnDelegate {
        encode,
        decode,
        _marker: PhantomData,
    }
}

impl<T, E, D> Delegate<T> for FnDelegate<T, E, D>
where
    T: 'static,
    E: Fn(&T) -> Result<Node, BoxError> + Send + Sync + 'static,
    D: Fn(&Node) -> Result<T, BoxError> + Send + Sync + 'static,
{
    fn encode(&self, value: &T) -> Result<Node, BoxError> {
        (self.encode)(value)
    }

    fn decode(&self, node: &Node) -> Result<T, BoxError> {
        (self.decode)(node)
    }
}

type AnyValue = dyn Any + Send + Sync;

/// A value of a caller-defined type, persisted through its registered
/// delegate.
///
/// The wrapped type must be `PartialEq` and `Debug` so that documents holding
/// opaque values can still be compared and logged.
#[derive(Clone)]
pub struct Opaque {
    value: Arc<AnyValue>,
    type_id: TypeId,
    type_name: &'static str,
    eq: fn(&AnyValue, &AnyValue) -> bool,
    debug: fn(&AnyValue, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Opaque {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
    {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            eq: eq_as::<T>,
            debug: debug_as::<T>,
        }
    }

    /// Returns true if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Name of the wrapped type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn value(&self) -> &AnyValue {
        self.value.as_ref()
    }
}

fn eq_as<T: Any + PartialEq>(a: &AnyValue, b: &AnyValue) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn debug_as<T: Any + fmt::Debug>(value: &AnyValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str("<opaque>"),
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && (self.eq)(self.value(), other.value())
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(self.value(), f)
    }
}

#[derive(Serialize, Deserialize)]
struct TaggedNode {
    #[serde(rename = "@delegate")]
    tag: String,
    value: Node,
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (tag, value) = scope::encode_opaque(self).map_err(S::Error::custom)?;
        TaggedNode { tag, value }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Opaque {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let TaggedNode { tag, value } = TaggedNode::deserialize(deserializer)?;
        scope::decode_opaque(&tag, &value).map_err(D::Error::custom)
    }
}

/// Type-erased view of a registered delegate.
pub(crate) trait ErasedDelegate: Send + Sync {
    fn encode_any(&self, value: &AnyValue) -> Result<Node, BoxError>;

    fn decode_any(&self, node: &Node) -> Result<Opaque, BoxError>;
}

struct Typed<T, D> {
    delegate: D,
    _marker: PhantomData<fn() -> T>,
}

impl<T, D> ErasedDelegate for Typed<T, D>
where
    T: Any + Send + Sync + PartialEq + fmt::Debug,
    D: Delegate<T>,
{
    fn encode_any(&self, value: &AnyValue) -> Result<Node, BoxError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| format!("value is not a {}", type_name::<T>()))?;
        self.delegate.encode(value)
    }

    fn decode_any(&self, node: &Node) -> Result<Opaque, BoxError> {
        self.delegate.decode(node).map(Opaque::new)
    }
}

#[derive(Clone)]
pub(crate) struct Registered {
    pub(crate) tag: String,
    pub(crate) delegate: Arc<dyn ErasedDelegate>,
}

/// Type-keyed delegate table. Last registration wins, per type and per tag.
#[derive(Clone, Default)]
pub(crate) struct DelegateRegistry {
    by_type: HashMap<TypeId, Registered>,
    by_tag: HashMap<String, TypeId>,
}

impl DelegateRegistry {
    pub(crate) fn register<T, D>(&mut self, tag: String, delegate: D)
    where
        T: Any + Send + Sync + PartialEq + fmt::Debug,
        D: Delegate<T>,
    {
        let type_id = TypeId::of::<T>();

        if let Some(previous) = self.by_type.remove(&type_id) {
            self.by_tag.remove(&previous.tag);
        }
        if let Some(displaced) = self.by_tag.remove(&tag) {
            self.by_type.remove(&displaced);
        }

        self.by_tag.insert(tag.clone(), type_id);
        self.by_type.insert(
            type_id,
            Registered {
                tag,
                delegate: Arc::new(Typed {
                    delegate,
                    _marker: PhantomData,
                }),
            },
        );
    }

    pub(crate) fn by_type(&self, type_id: TypeId) -> Option<&Registered> {
        self.by_type.get(&type_id)
    }

    pub(crate) fn by_tag(&self, tag: &str) -> Option<&Registered> {
        self.by_tag.get(tag).and_then(|id| self.by_type.get(id))
    }

    pub(crate) fn tag_of(&self, type_id: TypeId) -> Option<&str> {
        self.by_type.get(&type_id).map(|r| r.tag.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.by_type.len()
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRegistry")
            .field("tags", &self.by_tag.keys().collect::<Vec<_>>())
            .finish()
    }
}
