//! Language-agnostic stub production interface.
//!
//! This module provides:
//! - `StubProducer` trait: turns source bytes into a flat stub entry sequence
//! - `Registry`: factory-based producer lookup by file extension
//! - Tree-sitter implementations for multiple languages

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::stub::StubEntry;

#[cfg(feature = "tree-sitter")]
pub mod treesitter;

#[cfg(feature = "tree-sitter")]
pub mod languages;

/// Producer of stub entries for one language.
pub trait StubProducer: Send + Sync {
    /// Return the language this producer handles (e.g., "go", "python").
    fn language(&self) -> &str;

    /// Produce the entries for a file, root first, in document order.
    ///
    /// Partial parse errors still yield entries for whatever parsed; only a
    /// complete failure is an error.
    fn produce(&self, path: &Path, source: &[u8]) -> anyhow::Result<Vec<StubEntry>>;
}

/// Factory function type for creating producer instances.
pub type ProducerFactory = fn() -> Box<dyn StubProducer>;

lazy_static::lazy_static! {
    /// Global producer registry mapping file extensions to producer factories.
    static ref REGISTRY: RwLock<HashMap<String, ProducerFactory>> = RwLock::new(HashMap::new());
}

/// Register a producer factory for a file extension.
/// Extension should include the dot (e.g., ".go", ".py").
pub fn register(ext: &str, factory: ProducerFactory) {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry.insert(ext.to_string(), factory);
}

/// Get a producer for the given file extension.
/// Returns None if no producer is registered for the extension.
pub fn for_extension(ext: &str) -> Option<Box<dyn StubProducer>> {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    registry.get(ext).map(|factory| factory())
}

/// Get a producer for a file path, by its extension.
pub fn for_path(path: &Path) -> Option<Box<dyn StubProducer>> {
    let ext = path.extension()?.to_str()?;
    for_extension(&format!(".{}", ext))
}

/// Whether a producer is registered for the path's extension.
pub fn supports_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    registry.contains_key(&format!(".{}", ext))
}

/// Return all registered file extensions.
pub fn supported_extensions() -> Vec<String> {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    let mut exts: Vec<_> = registry.keys().cloned().collect();
    exts.sort();
    exts
}

/// Initialize the producer registry with all available language producers.
/// Call this once at startup before loading files.
#[cfg(feature = "tree-sitter")]
pub fn init() {
    languages::register_all();
}

/// Initialize (no-op when tree-sitter is disabled).
#[cfg(not(feature = "tree-sitter"))]
pub fn init() {
    // No tree-sitter producers available
}
