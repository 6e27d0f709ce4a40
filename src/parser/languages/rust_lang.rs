//! Rust language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{
    child_of_kind, node_text, Config, NameSource, StubRule, TreeSitterProducer,
};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

/// Grammar node kinds that become stubs.
///
/// Functions inside `impl` and `trait` bodies become methods.
static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "mod_item" => StubRule::new(StubKind::Module, NameSource::NAME),
    "struct_item" => StubRule::new(StubKind::Struct, NameSource::NAME),
    "union_item" => StubRule::new(StubKind::Struct, NameSource::NAME),
    "enum_item" => StubRule::new(StubKind::Enum, NameSource::NAME),
    "trait_item" => StubRule::new(StubKind::Trait, NameSource::NAME),
    "impl_item" => StubRule::new(StubKind::Impl, NameSource::Field("type")),
    "function_item" => StubRule::nested(StubKind::Function, StubKind::Method, NameSource::NAME),
    "function_signature_item" => {
        StubRule::nested(StubKind::Function, StubKind::Method, NameSource::NAME)
    },
    "field_declaration" => StubRule::new(StubKind::Field, NameSource::NAME),
    "const_item" => StubRule::new(StubKind::Const, NameSource::NAME),
    "static_item" => StubRule::new(StubKind::Const, NameSource::NAME),
    "type_item" => StubRule::new(StubKind::TypeAlias, NameSource::NAME),
    "use_declaration" => StubRule::new(StubKind::Import, NameSource::Field("argument")),
};

fn decorate(node: Node<'_>, source: &[u8], _kind: &mut StubKind, payload: &mut Payload) {
    if let Some(vis) = child_of_kind(node, "visibility_modifier").and_then(|v| node_text(v, source)) {
        payload.attributes.insert("visibility".to_string(), vis);
    }

    match node.kind() {
        "impl_item" => {
            if let Some(tr) = node
                .child_by_field_name("trait")
                .and_then(|t| node_text(t, source))
            {
                payload.attributes.insert("trait".to_string(), tr);
            }
        }
        "static_item" => {
            payload
                .attributes
                .insert("static".to_string(), "true".to_string());
        }
        "use_declaration" => {
            // `use a::b as c;` keeps the path as the name and the alias aside.
            let Some(arg) = node.child_by_field_name("argument") else {
                return;
            };
            if arg.kind() == "use_as_clause" {
                if let Some(path) = arg
                    .child_by_field_name("path")
                    .and_then(|p| node_text(p, source))
                {
                    payload.name = path;
                }
                if let Some(alias) = arg
                    .child_by_field_name("alias")
                    .and_then(|a| node_text(a, source))
                {
                    payload.attributes.insert("alias".to_string(), alias);
                }
            }
        }
        _ => {}
    }
}

/// Create a new Rust producer.
pub fn new_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(Config {
        language: tree_sitter_rust::LANGUAGE.into(),
        language_name: "rust",
        rules: &RULES,
        decorate: Some(decorate),
    }))
}

/// Register Rust producer for .rs extension.
pub fn register() {
    crate::parser::register(".rs", new_producer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubTree;
    use std::path::Path;

    const SOURCE: &[u8] = br#"
use std::collections::HashMap;
use std::fmt::Result as FmtResult;

pub struct Config {
    pub name: String,
    retries: u32,
}

impl Config {
    pub fn new() -> Self {
        Self { name: String::new(), retries: 0 }
    }

    fn validate(&self) -> bool {
        true
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

trait Greeter {
    fn greet(&self);
}

enum Mode {
    Fast,
    Slow,
}

const MAX: u32 = 3;

mod inner {
    fn helper() {}
}

fn main() {}
"#;

    fn tree() -> StubTree {
        let entries = new_producer()
            .produce(Path::new("src/lib.rs"), SOURCE)
            .unwrap();
        StubTree::build(&entries).unwrap()
    }

    #[test]
    fn test_rust_top_level_shape() {
        let tree = tree();
        let root = tree.root();
        assert_eq!(root.name(), "lib.rs");

        let kinds: Vec<_> = root.children().map(|c| (c.kind(), c.name().to_string())).collect();
        assert_eq!(
            kinds,
            vec![
                (StubKind::Import, "std::collections::HashMap".to_string()),
                (StubKind::Import, "std::fmt::Result".to_string()),
                (StubKind::Struct, "Config".to_string()),
                (StubKind::Impl, "Config".to_string()),
                (StubKind::Impl, "Config".to_string()),
                (StubKind::Trait, "Greeter".to_string()),
                (StubKind::Enum, "Mode".to_string()),
                (StubKind::Const, "MAX".to_string()),
                (StubKind::Module, "inner".to_string()),
                (StubKind::Function, "main".to_string()),
            ]
        );
    }

    #[test]
    fn test_rust_members_and_attributes() {
        let tree = tree();

        let alias = tree.refs_of_type(StubKind::Import).nth(1).unwrap();
        assert_eq!(alias.payload().attr("alias"), Some("FmtResult"));

        let config = tree.root().find_child_of_type(StubKind::Struct).unwrap();
        assert_eq!(config.payload().attr("visibility"), Some("pub"));
        let fields = config.children_of_type(StubKind::Field);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].payload().attr("visibility"), Some("pub"));
        assert_eq!(fields[1].payload().attr("visibility"), None);

        let impls = tree.root().children_of_type(StubKind::Impl);
        let inherent: Vec<_> = impls[0].children().map(|m| m.name().to_string()).collect();
        assert_eq!(inherent, vec!["new", "validate"]);
        assert_eq!(impls[1].payload().attr("trait"), Some("Default"));

        let default = impls[1].find_child_of_type(StubKind::Method).unwrap();
        assert_eq!(default.payload().attr("receiver"), Some("Config"));

        let greeter = tree.root().find_child_of_type(StubKind::Trait).unwrap();
        assert_eq!(greeter.children_of_type(StubKind::Method).len(), 1);

        let inner = tree.root().find_child_of_type(StubKind::Module).unwrap();
        let helper = inner.find_child_of_type(StubKind::Function).unwrap();
        assert_eq!(helper.name(), "helper");
    }
}
