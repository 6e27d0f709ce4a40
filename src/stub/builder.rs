//! Single-pass construction of stub trees.

use super::{NodeId, Payload, StubKind, StubNode, StubTree};
use crate::error::BuildError;

/// One element of the flat sequence a producer emits.
///
/// Entries are in document order. `depth` counts ancestors: the first entry
/// is the root at depth 0, every later entry sits at depth 1 or deeper and
/// may be at most one level below the entry before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubEntry {
    pub kind: StubKind,
    pub payload: Payload,
    pub depth: usize,
}

impl StubEntry {
    pub fn new(kind: StubKind, payload: Payload, depth: usize) -> Self {
        Self {
            kind,
            payload,
            depth,
        }
    }
}

/// Accumulates nodes and hands out an immutable [`StubTree`] when done.
///
/// A node is linked into its parent's child list in the same call that
/// creates it, so the child order is fixed by the order of `attach` calls.
#[derive(Debug, Default)]
pub struct StubTreeBuilder {
    nodes: Vec<StubNode>,
}

impl StubTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node under `parent`, or the root when `parent` is `None`.
    pub fn attach(
        &mut self,
        parent: Option<NodeId>,
        kind: StubKind,
        payload: Payload,
    ) -> Result<NodeId, BuildError> {
        payload.validate()?;

        match parent {
            None if !self.nodes.is_empty() => {
                return Err(BuildError::SecondRoot {
                    index: self.nodes.len(),
                })
            }
            Some(p) if p.index() >= self.nodes.len() => return Err(BuildError::UnknownParent(p)),
            _ => {}
        }

        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(StubNode {
            kind,
            payload,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        Ok(id)
    }

    /// Number of nodes attached so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze the nodes into a tree.
    pub fn build(self) -> Result<StubTree, BuildError> {
        if self.nodes.is_empty() {
            return Err(BuildError::Empty);
        }
        Ok(StubTree::from_nodes(self.nodes))
    }

    /// Build a tree from a producer's flat entry sequence.
    pub fn from_entries(entries: &[StubEntry]) -> Result<StubTree, BuildError> {
        let mut builder = StubTreeBuilder::new();
        // stack[d] is the most recent node at depth d
        let mut stack: Vec<NodeId> = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            if index == 0 {
                if entry.depth != 0 {
                    return Err(BuildError::BadNesting {
                        index,
                        depth: entry.depth,
                        max: 0,
                    });
                }
            } else if entry.depth == 0 {
                return Err(BuildError::SecondRoot { index });
            } else if entry.depth > stack.len() {
                return Err(BuildError::BadNesting {
                    index,
                    depth: entry.depth,
                    max: stack.len(),
                });
            }

            stack.truncate(entry.depth);
            let parent = stack.last().copied();
            let id = builder.attach(parent, entry.kind, entry.payload.clone())?;
            stack.push(id);
        }

        builder.build()
    }
}
