//! Language-specific tree-sitter configurations.
//!
//! Each language module provides:
//! - A rule table mapping grammar node kinds to stub kinds
//! - An optional decorate hook for visibility, supertypes and aliases
//! - Factory function for creating producers

pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust_lang;
pub mod typescript;

/// Register all available language producers.
pub fn register_all() {
    go::register();
    java::register();
    javascript::register();
    python::register();
    rust_lang::register();
    typescript::register();
}
