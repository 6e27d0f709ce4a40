//! Python language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{node_text, Config, NameSource, StubRule, TreeSitterProducer};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "class_definition" => StubRule::new(StubKind::Class, NameSource::NAME),
    "function_definition" => {
        StubRule::nested(StubKind::Function, StubKind::Method, NameSource::NAME)
    },
    "import_statement" => StubRule::new(StubKind::Import, NameSource::NAME),
    "import_from_statement" => StubRule::new(StubKind::Import, NameSource::Field("module_name")),
};

fn decorate(node: Node<'_>, source: &[u8], _kind: &mut StubKind, payload: &mut Payload) {
    match node.kind() {
        "class_definition" => {
            // `class A(Base, Mixin):` records the first base.
            let base = node
                .child_by_field_name("superclasses")
                .and_then(|args| args.named_child(0))
                .and_then(|b| node_text(b, source));
            if let Some(base) = base {
                payload.attributes.insert("extends".to_string(), base);
            }
        }
        "import_statement" => {
            let Some(name) = node.child_by_field_name("name") else {
                return;
            };
            if name.kind() == "aliased_import" {
                if let Some(path) = name
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, source))
                {
                    payload.name = path;
                }
                if let Some(alias) = name
                    .child_by_field_name("alias")
                    .and_then(|a| node_text(a, source))
                {
                    payload.attributes.insert("alias".to_string(), alias);
                }
            }
        }
        _ => {}
    }

    let is_dunder = payload.name.starts_with("__") && payload.name.ends_with("__");
    if payload.name.starts_with('_') && !is_dunder {
        payload
            .attributes
            .insert("visibility".to_string(), "private".to_string());
    }
}

/// Create a new Python producer.
pub fn new_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(Config {
        language: tree_sitter_python::LANGUAGE.into(),
        language_name: "python",
        rules: &RULES,
        decorate: Some(decorate),
    }))
}

/// Register Python producer for .py extension.
pub fn register() {
    crate::parser::register(".py", new_producer);
}
