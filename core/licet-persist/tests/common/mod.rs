//! Shared fixtures for persistence tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use licet_persist::{BoxError, Codec, Delegate, Node, Opaque, delegate_fn};
use serde::{Deserialize, Serialize};

/// A type with no serde support and no default construction path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    algorithm: String,
    digest: Vec<u8>,
}

impl Fingerprint {
    pub fn new(algorithm: &str, digest: &[u8]) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            digest: digest.to_vec(),
        }
    }
}

pub struct FingerprintDelegate;

impl Delegate<Fingerprint> for FingerprintDelegate {
    fn encode(&self, value: &Fingerprint) -> Result<Node, BoxError> {
        Ok(serde_json::json!({
            "algorithm": value.algorithm,
            "digest": value.digest,
        }))
    }

    fn decode(&self, node: &Node) -> Result<Fingerprint, BoxError> {
        let algorithm = node
            .get("algorithm")
            .and_then(Node::as_str)
            .ok_or("missing algorithm")?;
        let digest: Vec<u8> = serde_json::from_value(
            node.get("digest").cloned().ok_or("missing digest")?,
        )?;
        Ok(Fingerprint::new(algorithm, &digest))
    }
}

/// A value whose delegate always fails to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unencodable;

#[derive(Debug, thiserror::Error)]
#[error("refusing to encode {0}")]
pub struct RefusedError(pub String);

pub fn unencodable_delegate() -> impl Delegate<Unencodable> {
    delegate_fn(
        |_: &Unencodable| Err(Box::new(RefusedError("unencodable".into())) as BoxError),
        |_: &Node| Ok(Unencodable),
    )
}

/// A value whose delegate panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explosive;

pub fn explosive_delegate() -> impl Delegate<Explosive> {
    delegate_fn(
        |_: &Explosive| -> Result<Node, BoxError> { panic!("delegate blew up") },
        |_: &Node| -> Result<Explosive, BoxError> { panic!("delegate blew up") },
    )
}

/// A nested record mixing primitives, collections and an opaque value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub name: String,
    pub count: u64,
    pub ratio: f64,
    pub active: bool,
    pub tags: Vec<String>,
    pub attributes: BTreeMap<String, i64>,
    pub parent: Option<Box<Inventory>>,
    pub extra: Option<Opaque>,
}

pub fn inventory() -> Inventory {
    Inventory {
        name: "seat pool".into(),
        count: 12,
        ratio: 0.25,
        active: true,
        tags: vec!["floating".into(), "eu".into()],
        attributes: BTreeMap::from([("max".to_string(), 20), ("min".to_string(), -1)]),
        parent: Some(Box::new(Inventory {
            name: "root".into(),
            count: 0,
            ratio: 1.0,
            active: false,
            tags: Vec::new(),
            attributes: BTreeMap::new(),
            parent: None,
            extra: None,
        })),
        extra: Some(Opaque::new(Fingerprint::new("sha256", &[1, 2, 3, 4]))),
    }
}

pub fn codec() -> Codec {
    let mut codec = Codec::new();
    codec
        .register_delegate::<Fingerprint, _>("test.fingerprint", FingerprintDelegate)
        .register_delegate::<Unencodable, _>("test.unencodable", unencodable_delegate())
        .register_delegate::<Explosive, _>("test.explosive", explosive_delegate());
    codec
}

/// Wraps any value in an `Inventory` so it lands nested inside the graph.
pub fn with_extra(extra: Opaque) -> Inventory {
    Inventory {
        extra: Some(extra),
        ..inventory()
    }
}
