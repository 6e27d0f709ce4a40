//! Integration tests for tree-sitter stub producers.
//!
//! These tests build stub trees from the testdata fixtures and check the
//! declarations and nesting each language producer reports.

#![cfg(feature = "tree-sitter")]

use std::fs;
use std::path::{Path, PathBuf};

use stubtree::parser;
use stubtree::stub::{StubKind, StubRef, StubTree};

/// Initialize producers before running tests.
fn setup() {
    parser::init();
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn build(name: &str) -> StubTree {
    setup();
    let path = fixture(name);
    let source = fs::read(&path).expect("fixture should exist");
    let producer = parser::for_path(&path).expect("producer should be registered");
    let entries = producer
        .produce(&path, &source)
        .expect("fixture should parse");
    StubTree::build(&entries).expect("entries should form a tree")
}

fn names(stubs: &[StubRef<'_>]) -> Vec<String> {
    stubs.iter().map(|s| s.name().to_string()).collect()
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_supported_extensions() {
    setup();
    let exts = parser::supported_extensions();
    for ext in [".rs", ".py", ".java", ".go", ".ts", ".tsx", ".js"] {
        assert!(exts.contains(&ext.to_string()), "missing {}", ext);
    }
    assert!(parser::supports_path(Path::new("src/lib.rs")));
    assert!(!parser::supports_path(Path::new("README.md")));
}

// =============================================================================
// Rust
// =============================================================================

#[test]
fn test_rust_fixture() {
    let tree = build("sample.rs");
    let root = tree.root();
    assert_eq!(root.payload().attr("language"), Some("rust"));
    assert_eq!(root.payload().attr("parse_errors"), None);

    let cache = root.find_child_of_type(StubKind::Struct).unwrap();
    assert_eq!(cache.name(), "Cache");
    assert_eq!(
        names(&cache.children_of_type(StubKind::Field)),
        vec!["entries", "capacity"]
    );

    let impls = root.children_of_type(StubKind::Impl);
    assert_eq!(impls.len(), 2);
    assert_eq!(
        names(&impls[0].children_of_type(StubKind::Method)),
        vec!["new", "get", "evict"]
    );
    assert_eq!(impls[1].payload().attr("trait"), Some("Store"));

    // Every method sits under a type-like stub.
    for method in tree.refs_of_type(StubKind::Method) {
        assert!(method.parent().unwrap().kind().is_type_like());
    }

    assert_eq!(tree.nodes_of_type(StubKind::Function).len(), 0);
    assert_eq!(
        root.find_child_of_type(StubKind::Const).unwrap().name(),
        "DEFAULT_CAPACITY"
    );
    assert_eq!(
        root.find_child_of_type(StubKind::TypeAlias).unwrap().name(),
        "Key"
    );
    assert_eq!(root.find_child_of_type(StubKind::Enum).unwrap().name(), "Policy");
}

#[test]
fn test_building_twice_is_structurally_equal() {
    let a = build("sample.rs");
    let b = build("sample.rs");
    assert!(a.structurally_eq(&b));
    assert_eq!(a.print_tree(), b.print_tree());
}

// =============================================================================
// Python
// =============================================================================

#[test]
fn test_python_fixture() {
    let tree = build("sample.py");
    let root = tree.root();

    assert_eq!(
        names(&root.children_of_type(StubKind::Import)),
        vec!["json", "typing"]
    );

    let classes = root.children_of_type(StubKind::Class);
    assert_eq!(names(&classes), vec!["Repository", "CachedRepository"]);
    assert_eq!(
        names(&classes[0].children_of_type(StubKind::Method)),
        vec!["__init__", "load", "_index"]
    );
    assert_eq!(classes[1].payload().attr("extends"), Some("Repository"));

    let func = root.find_child_of_type(StubKind::Function).unwrap();
    assert_eq!(func.name(), "open_repository");
}

// =============================================================================
// Java
// =============================================================================

#[test]
fn test_java_fixture() {
    let tree = build("Sample.java");
    let root = tree.root();

    assert_eq!(
        root.find_child_of_type(StubKind::Module).unwrap().name(),
        "org.example.store"
    );
    assert_eq!(root.children_of_type(StubKind::Import).len(), 2);

    let sample = root.find_child_of_type(StubKind::Class).unwrap();
    assert_eq!(
        names(&sample.children_of_type(StubKind::Method)),
        vec!["Sample", "get", "put"]
    );
    assert_eq!(
        names(&sample.children_of_type(StubKind::Field)),
        vec!["values"]
    );
    assert_eq!(
        names(&sample.children_of_type(StubKind::Const)),
        vec!["LIMIT"]
    );

    let put = sample.children_of_type(StubKind::Method)[2];
    assert_eq!(put.payload().attr("visibility"), Some("protected"));

    let listener = sample.find_child_of_type(StubKind::Interface).unwrap();
    assert_eq!(listener.child_count(), 1);
    assert_eq!(sample.find_child_of_type(StubKind::Enum).unwrap().name(), "Mode");
}

// =============================================================================
// Go
// =============================================================================

#[test]
fn test_go_fixture() {
    let tree = build("sample.go");
    let root = tree.root();

    assert_eq!(
        root.find_child_of_type(StubKind::Module).unwrap().name(),
        "store"
    );
    assert_eq!(
        names(&root.children_of_type(StubKind::Import)),
        vec!["errors", "sync"]
    );

    let store = root.find_child_of_type(StubKind::Struct).unwrap();
    assert_eq!(
        names(&store.children_of_type(StubKind::Field)),
        vec!["mu", "entries"]
    );
    assert_eq!(
        root.find_child_of_type(StubKind::Interface).unwrap().name(),
        "Reader"
    );

    let methods = root.children_of_type(StubKind::Method);
    assert_eq!(names(&methods), vec!["Get", "put"]);
    assert!(methods
        .iter()
        .all(|m| m.payload().attr("receiver") == Some("Store")));
    assert_eq!(methods[0].payload().attr("visibility"), Some("exported"));
    assert_eq!(methods[1].payload().attr("visibility"), None);

    assert_eq!(
        root.find_child_of_type(StubKind::Function).unwrap().name(),
        "NewStore"
    );
    assert_eq!(
        root.find_child_of_type(StubKind::Const).unwrap().name(),
        "MaxEntries"
    );
}
