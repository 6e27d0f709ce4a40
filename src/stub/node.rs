//! Stub node storage: ids, payloads, and arena entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::StubKind;
use crate::error::BuildError;

/// Index of a node within its tree's arena.
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque attributes captured when a stub is built.
///
/// Values are plain strings; a payload never refers to parse-tree or live
/// objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Payload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute, replacing any previous value for the key.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Start line (1-indexed), when the producer recorded one.
    pub fn line(&self) -> Option<usize> {
        self.attr("line").and_then(|l| l.parse().ok())
    }

    /// Names and keys are single-line; keys are non-empty.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.name.chars().any(char::is_control) {
            return Err(BuildError::MalformedPayload(format!(
                "name {:?} contains control characters",
                self.name
            )));
        }
        for (key, value) in &self.attributes {
            if key.is_empty() || key.chars().any(|c| c.is_control() || c.is_whitespace()) {
                return Err(BuildError::MalformedPayload(format!(
                    "invalid attribute key {:?}",
                    key
                )));
            }
            if value.contains('\n') {
                return Err(BuildError::MalformedPayload(format!(
                    "attribute {:?} spans multiple lines",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// A single entry in a stub tree arena.
#[derive(Debug, Clone)]
pub struct StubNode {
    pub(crate) kind: StubKind,
    pub(crate) payload: Payload,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl StubNode {
    pub fn kind(&self) -> StubKind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
