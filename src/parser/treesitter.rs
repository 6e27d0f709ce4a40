//! Tree-sitter based stub producer.
//!
//! This module provides a generic tree-sitter walker that can be configured
//! for different languages via a table of node-kind rules. The walker visits
//! the syntax tree once in document order; every node whose kind has a rule
//! and a resolvable name becomes a stub entry, and its descendants are
//! nested one level below it.

use std::path::Path;

use tree_sitter::{Language, Node, Parser as TsParser, Tree};

use super::StubProducer;
use crate::stub::{Payload, StubEntry, StubKind};

/// Where a rule finds the declaration's name.
#[derive(Debug, Clone, Copy)]
pub enum NameSource {
    /// A field of the node itself (e.g., `name`).
    Field(&'static str),
    /// A chain of fields (e.g., `declarator` then `name`).
    FieldPath(&'static [&'static str]),
    /// The node's first named child.
    FirstNamedChild,
}

impl NameSource {
    /// The common case: a `name` field.
    pub const NAME: NameSource = NameSource::Field("name");

    fn resolve<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match self {
            NameSource::Field(field) => node.child_by_field_name(field),
            NameSource::FieldPath(path) => path
                .iter()
                .try_fold(node, |n, field| n.child_by_field_name(field)),
            NameSource::FirstNamedChild => {
                let mut cursor = node.walk();
                let first = node.named_children(&mut cursor).next();
                first
            }
        }
    }
}

/// How one grammar node kind maps to a stub.
#[derive(Debug, Clone, Copy)]
pub struct StubRule {
    /// Stub kind to emit.
    pub kind: StubKind,
    /// Kind to emit instead when the enclosing stub is type-like
    /// (functions inside classes become methods).
    pub nested_kind: Option<StubKind>,
    pub name: NameSource,
}

impl StubRule {
    pub const fn new(kind: StubKind, name: NameSource) -> Self {
        Self {
            kind,
            nested_kind: None,
            name,
        }
    }

    pub const fn nested(kind: StubKind, nested_kind: StubKind, name: NameSource) -> Self {
        Self {
            kind,
            nested_kind: Some(nested_kind),
            name,
        }
    }
}

/// Language hook run on every emitted entry; may refine the kind and add
/// attributes.
pub type Decorate = fn(Node<'_>, &[u8], &mut StubKind, &mut Payload);

/// Configuration for a tree-sitter language producer.
#[derive(Clone)]
pub struct Config {
    /// The tree-sitter language
    pub language: Language,
    /// Language name (e.g., "python", "go")
    pub language_name: &'static str,
    /// Grammar node kind → stub rule
    pub rules: &'static phf::Map<&'static str, StubRule>,
    /// Optional per-language refinement
    pub decorate: Option<Decorate>,
}

/// Nesting context for the nodes at one cursor level.
#[derive(Debug, Clone, Copy)]
struct Frame {
    depth: usize,
    kind: StubKind,
    /// Index of the enclosing entry; `None` at file level.
    owner: Option<usize>,
}

/// Tree-sitter based producer.
pub struct TreeSitterProducer {
    config: Config,
}

impl TreeSitterProducer {
    /// Create a new tree-sitter producer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parse source code and return the tree.
    fn parse(&self, source: &[u8]) -> anyhow::Result<Tree> {
        let mut parser = TsParser::new();
        parser.set_language(&self.config.language)?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse source"))
    }

    /// Visit every named node in document order without recursing, so
    /// deeply nested source cannot exhaust the stack.
    fn walk(&self, root: Node<'_>, source: &[u8], entries: &mut Vec<StubEntry>) {
        let mut cursor = root.walk();
        if !cursor.goto_first_child() {
            return;
        }

        // One frame per cursor level below the root: the context its nodes nest in.
        let mut frames = vec![Frame {
            depth: 1,
            kind: StubKind::File,
            owner: None,
        }];

        'walk: loop {
            let node = cursor.node();
            if node.is_named() {
                let frame = frames[frames.len() - 1];
                let enclosing_name = frame
                    .owner
                    .map_or("", |i| entries[i].payload.name.as_str());
                let enclosing = (frame.kind, enclosing_name);
                let inner = match self.entry_for(node, source, frame.depth, enclosing) {
                    Some(entry) => {
                        let inner = Frame {
                            depth: frame.depth + 1,
                            kind: entry.kind,
                            owner: Some(entries.len()),
                        };
                        entries.push(entry);
                        inner
                    }
                    None => frame,
                };
                if cursor.goto_first_child() {
                    frames.push(inner);
                    continue;
                }
            }

            while !cursor.goto_next_sibling() {
                if frames.len() == 1 || !cursor.goto_parent() {
                    break 'walk;
                }
                frames.pop();
            }
        }
    }

    fn entry_for(
        &self,
        node: Node<'_>,
        source: &[u8],
        depth: usize,
        enclosing: (StubKind, &str),
    ) -> Option<StubEntry> {
        let rule = self.config.rules.get(node.kind())?;
        let name = node_text(rule.name.resolve(node)?, source)?;

        let (enclosing_kind, enclosing_name) = enclosing;
        let mut kind = match rule.nested_kind {
            Some(nested) if enclosing_kind.is_type_like() => nested,
            _ => rule.kind,
        };

        let mut payload =
            Payload::new(name).with_attr("line", (node.start_position().row + 1).to_string());
        if kind == StubKind::Method && enclosing_kind.is_type_like() && !enclosing_name.is_empty()
        {
            payload = payload.with_attr("receiver", enclosing_name);
        }
        if let Some(decorate) = self.config.decorate {
            decorate(node, source, &mut kind, &mut payload);
        }

        Some(StubEntry::new(kind, payload, depth))
    }
}

impl StubProducer for TreeSitterProducer {
    fn language(&self) -> &str {
        self.config.language_name
    }

    fn produce(&self, path: &Path, source: &[u8]) -> anyhow::Result<Vec<StubEntry>> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut file = Payload::new(file_name).with_attr("language", self.config.language_name);
        if root.has_error() {
            file = file.with_attr("parse_errors", "true");
        }

        let mut entries = vec![StubEntry::new(StubKind::File, file, 0)];
        self.walk(root, source, &mut entries);
        Ok(entries)
    }
}

/// Normalized single-line text of a node, or `None` if it is empty.
///
/// Whitespace runs collapse to one space; a trailing `;` and surrounding
/// quotes are dropped so string-literal import paths read as plain paths.
pub fn node_text(node: Node<'_>, source: &[u8]) -> Option<String> {
    let raw = node.utf8_text(source).ok()?;
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = joined
        .trim_end_matches(';')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string();
    (!text.is_empty()).then_some(text)
}

/// First named child of `node` with the given grammar kind.
pub fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}
