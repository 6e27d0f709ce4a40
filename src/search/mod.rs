//! Name search over loaded stub trees.
//!
//! Requests are deduplicated by [`RequestIdentity`] before any tree is
//! scanned, each tree is one shard searched on the rayon pool, and shard
//! results are merged by identity into an immutable [`SearchResults`].

mod identity;

pub use identity::{IdentityValue, RequestIdentity};

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::stub::{NodeId, StubKind, StubRef, StubTree};

/// How a request's target is compared with stub names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SearchStrategy {
    Exact,
    Prefix,
    TextOccurrence,
}

impl SearchStrategy {
    /// Tag used in request identities.
    pub fn tag(self) -> &'static str {
        match self {
            SearchStrategy::Exact => "exact",
            SearchStrategy::Prefix => "prefix",
            SearchStrategy::TextOccurrence => "textOccurrence",
        }
    }

    pub fn matches(self, name: &str, target: &str) -> bool {
        match self {
            SearchStrategy::Exact => name == target,
            SearchStrategy::Prefix => name.starts_with(target),
            SearchStrategy::TextOccurrence => name.contains(target),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a string names no known search strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown strategy `{0}` (expected exact, prefix, or text)")]
pub struct ParseStrategyError(pub String);

impl FromStr for SearchStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(SearchStrategy::Exact),
            "prefix" => Ok(SearchStrategy::Prefix),
            "text" | "textOccurrence" => Ok(SearchStrategy::TextOccurrence),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Find stubs whose name matches `target`.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    target: String,
    strategy: SearchStrategy,
    kind: Option<StubKind>,
}

impl SearchRequest {
    pub fn new(target: impl Into<String>, strategy: SearchStrategy) -> Self {
        Self {
            target: target.into(),
            strategy,
            kind: None,
        }
    }

    /// Restrict matches to one stub kind.
    pub fn with_kind(mut self, kind: StubKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn kind(&self) -> Option<StubKind> {
        self.kind
    }

    /// `[target, strategy]`, plus the kind when one is set.
    pub fn identity(&self) -> RequestIdentity {
        let mut values = vec![
            IdentityValue::from(self.target.as_str()),
            IdentityValue::from(self.strategy.tag()),
        ];
        if let Some(kind) = self.kind {
            values.push(kind.into());
        }
        RequestIdentity::new(values)
    }

    fn matches(&self, stub: StubRef<'_>) -> bool {
        self.kind.map_or(true, |k| stub.kind() == k)
            && self.strategy.matches(stub.name(), &self.target)
    }

    /// Matching stubs of one tree, in document order.
    fn scan<'t>(&self, tree: &'t StubTree) -> Vec<StubRef<'t>> {
        match self.kind {
            // The type index skips every node of another kind.
            Some(kind) => tree.refs_of_type(kind).filter(|s| self.matches(*s)).collect(),
            None => tree
                .preorder()
                .into_iter()
                .filter_map(|id| tree.get(id))
                .filter(|s| self.matches(*s))
                .collect(),
        }
    }
}

/// Requests with duplicates removed, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    requests: Vec<SearchRequest>,
    merged: usize,
}

impl SearchPlan {
    pub fn new<I: IntoIterator<Item = SearchRequest>>(requests: I) -> Self {
        let mut seen = HashSet::new();
        let mut plan = SearchPlan::default();
        for request in requests {
            if seen.insert(request.identity()) {
                plan.requests.push(request);
            } else {
                plan.merged += 1;
            }
        }
        plan
    }

    pub fn requests(&self) -> &[SearchRequest] {
        &self.requests
    }

    /// How many submitted requests were folded into an earlier one.
    pub fn merged(&self) -> usize {
        self.merged
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// One matching stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub file: PathBuf,
    pub node: NodeId,
    pub kind: StubKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl SearchHit {
    fn from_stub(file: &Path, stub: StubRef<'_>) -> Self {
        Self {
            file: file.to_path_buf(),
            node: stub.id(),
            kind: stub.kind(),
            name: stub.name().to_string(),
            line: stub.payload().line(),
        }
    }
}

/// Hits grouped by request identity. Immutable once built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    groups: Vec<ResultGroup>,
}

#[derive(Debug, Clone, Serialize)]
struct ResultGroup {
    identity: RequestIdentity,
    hits: Vec<SearchHit>,
}

impl SearchResults {
    pub fn hits_for(&self, identity: &RequestIdentity) -> &[SearchHit] {
        self.groups
            .iter()
            .find(|g| &g.identity == identity)
            .map(|g| g.hits.as_slice())
            .unwrap_or_default()
    }

    /// Groups in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (&RequestIdentity, &[SearchHit])> {
        self.groups.iter().map(|g| (&g.identity, g.hits.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.hits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Accumulates hits from any number of shards; `build` snapshots them.
#[derive(Debug, Default)]
pub struct SearchResultsBuilder {
    order: Vec<RequestIdentity>,
    hits: HashMap<RequestIdentity, Vec<SearchHit>>,
}

impl SearchResultsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with an empty group for every request of `plan`.
    pub fn for_plan(plan: &SearchPlan) -> Self {
        let mut builder = Self::new();
        for request in plan.requests() {
            builder.group(request.identity());
        }
        builder
    }

    fn group(&mut self, identity: RequestIdentity) -> &mut Vec<SearchHit> {
        if !self.hits.contains_key(&identity) {
            self.order.push(identity.clone());
        }
        self.hits.entry(identity).or_default()
    }

    pub fn add(&mut self, identity: RequestIdentity, hit: SearchHit) -> &mut Self {
        self.group(identity).push(hit);
        self
    }

    /// Fold another shard's hits in, keyed by identity.
    pub fn merge(mut self, other: SearchResultsBuilder) -> Self {
        let SearchResultsBuilder { order, mut hits } = other;
        for identity in order {
            let shard_hits = hits.remove(&identity).unwrap_or_default();
            self.group(identity).extend(shard_hits);
        }
        self
    }

    /// Snapshot: hits per group sorted by file then node, duplicates dropped.
    pub fn build(mut self) -> SearchResults {
        let groups = self
            .order
            .into_iter()
            .map(|identity| {
                let mut hits = self.hits.remove(&identity).unwrap_or_default();
                hits.sort_by(|a, b| (&a.file, a.node).cmp(&(&b.file, b.node)));
                hits.dedup_by(|a, b| a.file == b.file && a.node == b.node);
                ResultGroup { identity, hits }
            })
            .collect();
        SearchResults { groups }
    }
}

/// Search over a set of loaded trees, one shard per file.
#[derive(Default)]
pub struct StubSearch {
    shards: Vec<(PathBuf, Arc<StubTree>)>,
}

impl StubSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tree(&mut self, file: impl Into<PathBuf>, tree: Arc<StubTree>) {
        self.shards.push((file.into(), tree));
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn run(&self, plan: &SearchPlan) -> SearchResults {
        let identities: Vec<RequestIdentity> =
            plan.requests().iter().map(SearchRequest::identity).collect();

        let merged = self
            .shards
            .par_iter()
            .map(|(file, tree)| {
                let mut shard = SearchResultsBuilder::new();
                for (request, identity) in plan.requests().iter().zip(&identities) {
                    for stub in request.scan(tree) {
                        shard.add(identity.clone(), SearchHit::from_stub(file, stub));
                    }
                }
                shard
            })
            .reduce(SearchResultsBuilder::new, SearchResultsBuilder::merge);

        // Seed from the plan so groups follow plan order.
        SearchResultsBuilder::for_plan(plan).merge(merged).build()
    }
}

impl FromIterator<(PathBuf, Arc<StubTree>)> for StubSearch {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Arc<StubTree>)>>(iter: I) -> Self {
        Self {
            shards: iter.into_iter().collect(),
        }
    }
}
