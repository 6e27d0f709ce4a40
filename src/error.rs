//! Error types for stub tree construction, persistence, and materialization.

use std::path::PathBuf;
use thiserror::Error;

use crate::stub::{NodeId, StubKind};

/// Errors surfaced to callers of the tree, registry, and loader APIs.
#[derive(Error, Debug)]
pub enum StubError {
    /// No factory is registered for a kind that appears in a tree.
    #[error("no live-node factory registered for stub kind `{0}`")]
    UnknownKind(StubKind),
    /// A factory could not interpret the stub it was given.
    #[error("failed to materialize {kind} stub {id}")]
    Materialization {
        kind: StubKind,
        id: NodeId,
        #[source]
        source: anyhow::Error,
    },
    /// The id does not belong to the tree it was used with.
    #[error("stub {0} does not exist in this tree")]
    InvalidNode(NodeId),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("no stub producer for {}", .0.display())]
    Unsupported(PathBuf),
    #[error("failed to read {}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed input to a tree build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no stub entries to build from")]
    Empty,
    #[error("entry {index} is a second root")]
    SecondRoot { index: usize },
    #[error("entry {index} has depth {depth}, expected 1..={max}")]
    BadNesting {
        index: usize,
        depth: usize,
        max: usize,
    },
    #[error("parent {0} has not been attached")]
    UnknownParent(NodeId),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("source could not be parsed: {0}")]
    Parse(String),
}

/// Failures of the persistence collaborator. Always recoverable by rebuilding.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persisted tree is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("persisted tree uses format {found}, expected {expected}")]
    FormatVersion { found: u32, expected: u32 },
    #[error("persisted tree is corrupt: {0}")]
    Corrupt(String),
}

pub type Result<T, E = StubError> = std::result::Result<T, E>;
