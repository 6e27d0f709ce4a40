//! The per-file stub tree and borrowed node handles.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::{KindSet, NodeId, Payload, StubKind, StubNode};
use crate::error::{Result, StubError};
use crate::live::{LiveNode, MaterializationCache, TypeRegistry};

/// Declaration summary of one source file.
///
/// Nodes live in an arena indexed by [`NodeId`]. The tree shape is frozen at
/// construction; the only interior mutability is the per-node live-node
/// slot, guarded by a lock that belongs to this tree alone.
pub struct StubTree {
    nodes: Vec<StubNode>,
    /// Kind → nodes of that kind in document order. Derived from `nodes`.
    index: HashMap<StubKind, Vec<NodeId>>,
    cache: MaterializationCache,
}

impl StubTree {
    pub(crate) fn from_nodes(nodes: Vec<StubNode>) -> Self {
        let cache = MaterializationCache::new(nodes.len());
        let mut tree = Self {
            nodes,
            index: HashMap::new(),
            cache,
        };
        tree.index = tree.derive_index();
        tree
    }

    fn derive_index(&self) -> HashMap<StubKind, Vec<NodeId>> {
        let mut index: HashMap<StubKind, Vec<NodeId>> = HashMap::new();
        for id in self.preorder() {
            index.entry(self.nodes[id.index()].kind).or_default().push(id);
        }
        index
    }

    pub fn root(&self) -> StubRef<'_> {
        StubRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// Handle for `id`, or `None` if the id is out of range.
    pub fn get(&self, id: NodeId) -> Option<StubRef<'_>> {
        (id.index() < self.nodes.len()).then_some(StubRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a built tree; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes of a kind, in document order, without materializing.
    pub fn nodes_of_type(&self, kind: StubKind) -> &[NodeId] {
        self.index.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Like [`nodes_of_type`](Self::nodes_of_type), as handles.
    pub fn refs_of_type(&self, kind: StubKind) -> impl Iterator<Item = StubRef<'_>> + '_ {
        self.nodes_of_type(kind)
            .iter()
            .map(move |&id| StubRef { tree: self, id })
    }

    /// Node count per kind.
    pub fn kind_counts(&self) -> BTreeMap<StubKind, usize> {
        self.index.iter().map(|(k, ids)| (*k, ids.len())).collect()
    }

    /// Node ids in document (pre-order) order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev());
        }
        order
    }

    /// Live node for `id`, built on first request.
    ///
    /// Concurrent callers for the same node all receive the same `Arc`; the
    /// registry's factory runs at most once per node.
    pub fn get_live(&self, id: NodeId, registry: &TypeRegistry) -> Result<Arc<LiveNode>> {
        let stub = self.get(id).ok_or(StubError::InvalidNode(id))?;
        self.cache.get_or_materialize(stub, registry)
    }

    /// The live node for `id` if one has already been built.
    pub fn cached_live(&self, id: NodeId) -> Option<Arc<LiveNode>> {
        self.cache.cached(id)
    }

    /// Number of nodes whose live node has been built.
    pub fn materialized_count(&self) -> usize {
        self.cache.populated()
    }

    /// Same kinds, payloads, and child order. Caches are ignored.
    pub fn structurally_eq(&self, other: &StubTree) -> bool {
        fn eq(a: StubRef<'_>, b: StubRef<'_>) -> bool {
            a.kind() == b.kind()
                && a.payload() == b.payload()
                && a.child_count() == b.child_count()
                && a.children().zip(b.children()).all(|(x, y)| eq(x, y))
        }
        self.len() == other.len() && eq(self.root(), other.root())
    }

    /// Indented dump, one node per line.
    pub fn print_tree(&self) -> String {
        self.root().print_tree()
    }
}

impl fmt::Debug for StubTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubTree")
            .field("nodes", &self.nodes.len())
            .field("materialized", &self.cache.populated())
            .finish()
    }
}

/// Borrowed handle to one node of a [`StubTree`].
#[derive(Clone, Copy)]
pub struct StubRef<'t> {
    tree: &'t StubTree,
    id: NodeId,
}

impl<'t> StubRef<'t> {
    fn node(&self) -> &'t StubNode {
        &self.tree.nodes[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t StubTree {
        self.tree
    }

    pub fn kind(&self) -> StubKind {
        self.node().kind
    }

    pub fn payload(&self) -> &'t Payload {
        &self.node().payload
    }

    pub fn name(&self) -> &'t str {
        &self.node().payload.name
    }

    pub fn parent(&self) -> Option<StubRef<'t>> {
        self.node().parent.map(|id| StubRef {
            tree: self.tree,
            id,
        })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = StubRef<'t>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    pub fn child_ids(&self) -> &'t [NodeId] {
        &self.node().children
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Direct children in document order.
    pub fn children(&self) -> impl Iterator<Item = StubRef<'t>> {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| StubRef { tree, id })
    }

    /// First direct child of `kind`.
    pub fn find_child_of_type(&self, kind: StubKind) -> Option<StubRef<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// Direct children of `kind`, in document order. Never fails.
    pub fn children_of_type(&self, kind: StubKind) -> Vec<StubRef<'t>> {
        self.filtered_children(|k| k == kind)
    }

    /// Direct children whose kind is in `kinds`, in document order.
    pub fn children_of_types(&self, kinds: &KindSet) -> Vec<StubRef<'t>> {
        self.filtered_children(|k| kinds.contains(k))
    }

    fn count_children(&self, matches: impl Fn(StubKind) -> bool) -> usize {
        self.children().filter(|c| matches(c.kind())).count()
    }

    // Two passes: count, then fill an exactly sized buffer.
    fn filtered_children(&self, matches: impl Fn(StubKind) -> bool) -> Vec<StubRef<'t>> {
        let count = self.count_children(&matches);
        let mut result = Vec::with_capacity(count);
        if count == 0 {
            return result;
        }
        result.extend(self.children().filter(|c| matches(c.kind())));
        debug_assert_eq!(result.len(), count);
        result
    }

    /// Live node for this stub. See [`StubTree::get_live`].
    pub fn live(&self, registry: &TypeRegistry) -> Result<Arc<LiveNode>> {
        self.tree.cache.get_or_materialize(*self, registry)
    }

    pub fn cached_live(&self) -> Option<Arc<LiveNode>> {
        self.tree.cache.cached(self.id)
    }

    /// Materialized children of `kind`, in document order.
    pub fn live_children_of_type(
        &self,
        registry: &TypeRegistry,
        kind: StubKind,
    ) -> Result<Vec<Arc<LiveNode>>> {
        self.filtered_live_children(registry, |k| k == kind)
    }

    /// Materialized children whose kind is in `kinds`, in document order.
    pub fn live_children_of_types(
        &self,
        registry: &TypeRegistry,
        kinds: &KindSet,
    ) -> Result<Vec<Arc<LiveNode>>> {
        self.filtered_live_children(registry, |k| kinds.contains(k))
    }

    fn filtered_live_children(
        &self,
        registry: &TypeRegistry,
        matches: impl Fn(StubKind) -> bool,
    ) -> Result<Vec<Arc<LiveNode>>> {
        let count = self.count_children(&matches);
        let mut result = Vec::with_capacity(count);
        if count == 0 {
            return Ok(result);
        }
        for child in self.children().filter(|c| matches(c.kind())) {
            result.push(child.live(registry)?);
        }
        debug_assert_eq!(result.len(), count);
        Ok(result)
    }

    /// Walk the parents, materializing each, and return the first live node
    /// accepted by `predicate`.
    pub fn find_ancestor_of_live_type(
        &self,
        registry: &TypeRegistry,
        predicate: impl Fn(&LiveNode) -> bool,
    ) -> Result<Option<Arc<LiveNode>>> {
        for ancestor in self.ancestors() {
            let live = ancestor.live(registry)?;
            if predicate(&live) {
                return Ok(Some(live));
            }
        }
        Ok(None)
    }

    /// Indented dump of this subtree.
    pub fn print_tree(&self) -> String {
        let mut out = String::new();
        self.print_into(&mut out, 0);
        out
    }

    fn print_into(&self, out: &mut String, level: usize) {
        for _ in 0..level {
            out.push_str("  ");
        }
        out.push_str(&self.to_string());
        out.push('\n');
        for child in self.children() {
            child.print_into(out, level + 1);
        }
    }
}

impl fmt::Display for StubRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name().is_empty() {
            write!(f, "{}", self.kind())
        } else {
            write!(f, "{} {}", self.kind(), self.name())
        }
    }
}

impl fmt::Debug for StubRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubEntry, StubTreeBuilder};

    fn sample() -> StubTree {
        let e = |kind, name: &str, depth| StubEntry::new(kind, Payload::new(name), depth);
        StubTreeBuilder::from_entries(&[
            e(StubKind::File, "shapes.rs", 0),
            e(StubKind::Struct, "Circle", 1),
            e(StubKind::Field, "radius", 2),
            e(StubKind::Impl, "Circle", 1),
            e(StubKind::Method, "area", 2),
            e(StubKind::Const, "PI", 2),
            e(StubKind::Method, "scale", 2),
            e(StubKind::Function, "main", 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_type_index_is_document_order() {
        let tree = sample();
        let methods: Vec<_> = tree
            .refs_of_type(StubKind::Method)
            .map(|m| m.name())
            .collect();
        assert_eq!(methods, vec!["area", "scale"]);
        assert!(tree.nodes_of_type(StubKind::Trait).is_empty());

        let total: usize = tree.kind_counts().values().sum();
        assert_eq!(total, tree.len());
    }

    #[test]
    fn test_children_of_type_exact_size() {
        let tree = sample();
        let imp = tree.root().find_child_of_type(StubKind::Impl).unwrap();

        let methods = imp.children_of_type(StubKind::Method);
        let counted = imp.children().filter(|c| c.kind() == StubKind::Method).count();
        assert_eq!(methods.len(), counted);
        assert_eq!(methods[0].name(), "area");
        assert_eq!(methods[1].name(), "scale");

        let members = imp.children_of_types(&KindSet::of(&[StubKind::Method, StubKind::Const]));
        let names: Vec<_> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["area", "PI", "scale"]);

        assert!(imp.children_of_type(StubKind::Field).is_empty());
    }

    #[test]
    fn test_ancestors_and_print() {
        let tree = sample();
        let field = tree.refs_of_type(StubKind::Field).next().unwrap();
        let chain: Vec<_> = field.ancestors().map(|a| a.kind()).collect();
        assert_eq!(chain, vec![StubKind::Struct, StubKind::File]);

        let printed = tree.print_tree();
        let expected = "\
file shapes.rs
  struct Circle
    field radius
  impl Circle
    method area
    const PI
    method scale
  function main
";
        assert_eq!(printed, expected);
    }

    #[test]
    fn test_preorder_independent_of_attach_order() {
        let mut builder = StubTreeBuilder::new();
        let root = builder.attach(None, StubKind::File, Payload::new("f")).unwrap();
        let a = builder.attach(Some(root), StubKind::Class, Payload::new("A")).unwrap();
        let b = builder.attach(Some(root), StubKind::Class, Payload::new("B")).unwrap();
        let c = builder.attach(Some(a), StubKind::Method, Payload::new("c")).unwrap();
        let tree = builder.build().unwrap();

        assert_eq!(tree.preorder(), vec![root, a, c, b]);
        assert_eq!(tree.nodes_of_type(StubKind::Class), &[a, b]);
    }

    #[test]
    fn test_structural_equality() {
        assert!(sample().structurally_eq(&sample()));

        let e = |kind, name: &str, depth| StubEntry::new(kind, Payload::new(name), depth);
        let other = StubTreeBuilder::from_entries(&[
            e(StubKind::File, "shapes.rs", 0),
            e(StubKind::Function, "main", 1),
        ])
        .unwrap();
        assert!(!sample().structurally_eq(&other));
    }

    #[test]
    fn test_get_out_of_range() {
        let tree = sample();
        assert!(tree.get(NodeId::from_index(tree.len())).is_none());
        assert!(matches!(
            tree.get_live(NodeId::from_index(99), TypeRegistry::standard()),
            Err(StubError::InvalidNode(_))
        ));
    }
}
