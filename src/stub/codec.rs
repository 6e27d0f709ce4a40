//! Persisted form of a stub tree.
//!
//! A tree is stored as a JSON document holding the format version, the
//! fingerprint of the source it was built from, and the nodes in document
//! order. Each node names its parent by position; a parent always precedes
//! its children, so decoding is a single pass through the same builder a
//! fresh build uses.

use serde::{Deserialize, Serialize};

use super::{NodeId, Payload, StubKind, StubTree, StubTreeBuilder};
use crate::error::PersistenceError;
use crate::fingerprint::Fingerprint;

/// Bumped whenever the persisted layout or stub semantics change.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedTree {
    format: u32,
    fingerprint: String,
    nodes: Vec<PersistedNode>,
}

#[derive(Serialize, Deserialize)]
struct PersistedNode {
    kind: StubKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
    payload: Payload,
}

/// A decoded tree together with the fingerprint it was stored under.
pub struct DecodedTree {
    pub fingerprint: Fingerprint,
    pub tree: StubTree,
}

/// Serialize `tree`, tagging it with the fingerprint of its source.
pub fn encode(tree: &StubTree, fingerprint: &Fingerprint) -> Result<Vec<u8>, PersistenceError> {
    let order = tree.preorder();
    // Arena ids need not be pre-order; persisted positions are.
    let mut position = vec![0u32; tree.len()];
    for (pos, id) in order.iter().enumerate() {
        position[id.index()] = pos as u32;
    }

    let nodes = order
        .iter()
        .filter_map(|&id| tree.get(id))
        .map(|stub| PersistedNode {
            kind: stub.kind(),
            parent: stub.parent().map(|p| position[p.id().index()]),
            payload: stub.payload().clone(),
        })
        .collect();

    let persisted = PersistedTree {
        format: FORMAT_VERSION,
        fingerprint: fingerprint.to_hex(),
        nodes,
    };
    Ok(serde_json::to_vec(&persisted)?)
}

/// Rebuild a tree from bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<DecodedTree, PersistenceError> {
    let persisted: PersistedTree = serde_json::from_slice(bytes)?;
    if persisted.format != FORMAT_VERSION {
        return Err(PersistenceError::FormatVersion {
            found: persisted.format,
            expected: FORMAT_VERSION,
        });
    }
    let fingerprint = Fingerprint::from_hex(&persisted.fingerprint).ok_or_else(|| {
        PersistenceError::Corrupt(format!("bad fingerprint {:?}", persisted.fingerprint))
    })?;

    let mut builder = StubTreeBuilder::new();
    for (pos, node) in persisted.nodes.into_iter().enumerate() {
        let parent = match node.parent {
            Some(p) if (p as usize) < pos => Some(NodeId::from_index(p as usize)),
            Some(p) => {
                return Err(PersistenceError::Corrupt(format!(
                    "node {} names parent {} which does not precede it",
                    pos, p
                )))
            }
            None => None,
        };
        builder
            .attach(parent, node.kind, node.payload)
            .map_err(|e| PersistenceError::Corrupt(format!("node {}: {}", pos, e)))?;
    }

    let tree = builder
        .build()
        .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    Ok(DecodedTree { fingerprint, tree })
}
