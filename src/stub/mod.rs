//! Stub trees: compact, persistable summaries of a file's declarations.
//!
//! A [`StubTree`] is built once from a producer's flat [`StubEntry`]
//! sequence (or decoded from its persisted form) and never changes shape
//! afterwards. Nodes are addressed by [`NodeId`] and read through
//! [`StubRef`] handles; full semantic objects are built lazily through
//! [`crate::live`].
//!
//! ```text
//! StubEntry* ──▶ StubTreeBuilder ──▶ StubTree ──▶ codec::encode ──▶ bytes
//!                      ▲                                             │
//!                      └────────────── codec::decode ◀───────────────┘
//! ```

pub mod codec;

mod builder;
mod kind;
mod node;
mod tree;

pub use builder::{StubEntry, StubTreeBuilder};
pub use kind::{KindSet, ParseKindError, StubKind};
pub use node::{NodeId, Payload, StubNode};
pub use tree::{StubRef, StubTree};

impl StubTree {
    /// Build a tree from a producer's entries.
    pub fn build(entries: &[StubEntry]) -> Result<StubTree, crate::error::BuildError> {
        StubTreeBuilder::from_entries(entries)
    }
}
