//! Live nodes: semantic objects rebuilt from stubs.

use serde::Serialize;

use crate::stub::{NodeId, StubKind, StubRef};

/// Semantic content of a live node, one variant per family of stub kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    File {
        name: String,
        language: Option<String>,
    },
    Module {
        name: String,
    },
    /// Classes, interfaces, structs, enums, traits, impls, and type aliases.
    Type {
        name: String,
        visibility: Option<String>,
        supertype: Option<String>,
    },
    /// Functions and methods.
    Callable {
        name: String,
        receiver: Option<String>,
        visibility: Option<String>,
    },
    /// Fields and constants.
    Variable {
        name: String,
        constant: bool,
        visibility: Option<String>,
    },
    Import {
        path: String,
        alias: Option<String>,
    },
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::File { name, .. }
            | Element::Module { name }
            | Element::Type { name, .. }
            | Element::Callable { name, .. }
            | Element::Variable { name, .. } => name,
            Element::Import { path, .. } => path,
        }
    }
}

/// A materialized stub.
///
/// Keeps the ids of its stub and the stub's parent for upward navigation
/// through the owning tree; it never owns stub data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveNode {
    stub: NodeId,
    parent: Option<NodeId>,
    kind: StubKind,
    #[serde(flatten)]
    element: Element,
}

impl LiveNode {
    pub fn new(stub: StubRef<'_>, element: Element) -> Self {
        Self {
            stub: stub.id(),
            parent: stub.parent().map(|p| p.id()),
            kind: stub.kind(),
            element,
        }
    }

    pub fn stub_id(&self) -> NodeId {
        self.stub
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> StubKind {
        self.kind
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn is_type(&self) -> bool {
        matches!(self.element, Element::Type { .. })
    }
}
