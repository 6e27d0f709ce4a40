//! Output formatting for stubtree commands.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::search::{SearchPlan, SearchResults};
use crate::stub::{NodeId, Payload, StubKind, StubRef, StubTree};

// =============================================================================
// Index summary
// =============================================================================

/// Outcome of indexing a directory.
#[derive(Debug, Default, Serialize)]
pub struct IndexSummary {
    pub path: String,
    pub files_indexed: usize,
    pub nodes: usize,
    pub kinds: BTreeMap<StubKind, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<IndexFailure>,
}

#[derive(Debug, Serialize)]
pub struct IndexFailure {
    pub file: String,
    pub error: String,
}

impl IndexSummary {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    pub fn add_tree(&mut self, tree: &StubTree) {
        self.files_indexed += 1;
        self.nodes += tree.len();
        for (kind, count) in tree.kind_counts() {
            *self.kinds.entry(kind).or_default() += count;
        }
    }

    pub fn add_failure(&mut self, file: &Path, error: impl std::fmt::Display) {
        self.failures.push(IndexFailure {
            file: file.to_string_lossy().to_string(),
            error: format!("{:#}", error),
        });
    }
}

pub fn write_index_json(summary: &IndexSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

pub fn write_index_pretty(summary: &IndexSummary) {
    write_header();
    print!("  {}", "Indexed: ".dimmed());
    println!("{}", summary.path);
    println!();

    println!(
        "  {} files, {} stubs",
        summary.files_indexed.to_string().bold(),
        summary.nodes.to_string().bold()
    );
    println!();

    if !summary.kinds.is_empty() {
        println!("  {}:", "Kinds".bold());
        for (kind, count) in &summary.kinds {
            println!("    {:<12} {:>6}", colored_kind(*kind), count);
        }
        println!();
    }

    if !summary.failures.is_empty() {
        println!("  {} ({}):", "Failures".bold(), summary.failures.len());
        for failure in &summary.failures {
            println!("    {} {}", "ERROR".red(), failure.file.blue());
            println!("          {}", failure.error);
        }
        println!();
    }
}

// =============================================================================
// Tree dump
// =============================================================================

#[derive(Serialize)]
struct JsonTree<'a> {
    file: String,
    nodes: Vec<JsonNode<'a>>,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    id: NodeId,
    kind: StubKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<NodeId>,
    depth: usize,
    #[serde(flatten)]
    payload: &'a Payload,
}

pub fn write_tree_json(file: &Path, tree: &StubTree) -> anyhow::Result<()> {
    let nodes = tree
        .preorder()
        .into_iter()
        .filter_map(|id| tree.get(id))
        .map(|stub| JsonNode {
            id: stub.id(),
            kind: stub.kind(),
            parent: stub.parent().map(|p| p.id()),
            depth: stub.ancestors().count(),
            payload: stub.payload(),
        })
        .collect();
    let report = JsonTree {
        file: file.to_string_lossy().to_string(),
        nodes,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn write_tree_pretty(tree: &StubTree) {
    println!();
    write_stub(tree.root(), 1);
    println!();
}

fn write_stub(stub: StubRef<'_>, indent: usize) {
    print!("{}{} {}", "  ".repeat(indent), colored_kind(stub.kind()), stub.name());
    if let Some(line) = stub.payload().line() {
        print!("{}", format!(":{}", line).dimmed());
    }
    println!();
    for child in stub.children() {
        write_stub(child, indent + 1);
    }
}

// =============================================================================
// Search results
// =============================================================================

#[derive(Serialize)]
struct JsonSearch<'a> {
    requests: usize,
    merged: usize,
    total: usize,
    results: &'a SearchResults,
}

pub fn write_search_json(plan: &SearchPlan, results: &SearchResults) -> anyhow::Result<()> {
    let report = JsonSearch {
        requests: plan.len(),
        merged: plan.merged(),
        total: results.total(),
        results,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn write_search_pretty(plan: &SearchPlan, results: &SearchResults, root: &Path) {
    write_header();
    if plan.merged() > 0 {
        println!(
            "  {}",
            format!("({} duplicate requests merged)", plan.merged()).dimmed()
        );
        println!();
    }

    for (identity, hits) in results.iter() {
        println!("  {} {} ({}):", "Query".bold(), identity, hits.len());
        for hit in hits {
            print!(
                "    {:<12} {:<24} {}",
                colored_kind(hit.kind),
                hit.name,
                display_path(&hit.file, root).blue()
            );
            if let Some(line) = hit.line {
                print!("{}", format!(":{}", line).dimmed());
            }
            println!();
        }
        println!();
    }

    if results.is_empty() {
        println!("  {}", "No matches".yellow());
        println!();
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn write_header() {
    println!();
    print!("  ");
    print!("{}", "stubtree".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn colored_kind(kind: StubKind) -> ColoredString {
    let name = kind.as_str();
    if kind.is_type_like() {
        name.green()
    } else if kind.is_callable() {
        name.yellow()
    } else {
        match kind {
            StubKind::File | StubKind::Module => name.cyan(),
            StubKind::Import => name.dimmed(),
            _ => name.normal(),
        }
    }
}

fn display_path(file: &Path, root: &Path) -> String {
    file.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| file.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubEntry;

    #[test]
    fn test_index_summary_accumulates() {
        let tree = StubTree::build(&[
            StubEntry::new(StubKind::File, Payload::new("a.py"), 0),
            StubEntry::new(StubKind::Class, Payload::new("A"), 1),
            StubEntry::new(StubKind::Method, Payload::new("run"), 2),
        ])
        .unwrap();

        let mut summary = IndexSummary::new(Path::new("src"));
        summary.add_tree(&tree);
        summary.add_tree(&tree);
        summary.add_failure(Path::new("src/b.py"), "boom");

        assert_eq!(summary.files_indexed, 2);
        assert_eq!(summary.nodes, 6);
        assert_eq!(summary.kinds[&StubKind::Method], 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kinds"]["class"], 2);
        assert_eq!(json["failures"][0]["error"], "boom");
    }

    #[test]
    fn test_display_path_strips_root() {
        assert_eq!(
            display_path(Path::new("/repo/src/a.rs"), Path::new("/repo")),
            "src/a.rs"
        );
        assert_eq!(
            display_path(Path::new("/elsewhere/a.rs"), Path::new("/repo")),
            "/elsewhere/a.rs"
        );
    }
}
