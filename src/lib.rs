//! Stubtree - persistable declaration stub trees.
//!
//! A stub tree is a compact summary of the declarations in one source
//! file: what kinds of things it declares, their names and attributes, and
//! how they nest. Trees are built once from a parse, persisted keyed by the
//! file's content, and turned into full semantic objects ("live nodes")
//! only when a consumer asks for one.
//!
//! # Architecture
//!
//! - `stub`: the immutable node arena, its type index, and its persisted form
//! - `live`: lazy, at-most-once materialization of stubs into live nodes
//! - `loader`: build-or-reuse decisions per file, with staleness checks
//! - `storage`: byte stores backing the loader (disk, memory)
//! - `parser`: tree-sitter stub producers, registered per file extension
//! - `search`: deduplicated name search across many trees
//! - `config`: YAML configuration schema
//! - `report`: Output formatting (text, JSON)
//!
//! # Adding a New Language
//!
//! See `src/parser/languages/` for examples. Write a rule table mapping
//! grammar node kinds to stub kinds and register the producer for its file
//! extensions in `languages/mod.rs`.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod live;
pub mod loader;
pub mod parser;
pub mod report;
pub mod search;
pub mod storage;
pub mod stub;

pub use config::Config;
pub use error::{BuildError, PersistenceError, Result, StubError};
pub use fingerprint::Fingerprint;
pub use live::{Element, LiveNode, TypeRegistry};
pub use loader::{SourceFile, StubTreeLoader};
pub use parser::{for_extension, init as init_producers, StubProducer};
pub use search::{RequestIdentity, SearchPlan, SearchRequest, SearchStrategy, StubSearch};
pub use storage::{FileStorage, MemoryStorage, StubStorage};
pub use stub::{NodeId, Payload, StubEntry, StubKind, StubRef, StubTree};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    init_producers();
}
