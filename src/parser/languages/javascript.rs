//! JavaScript language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{
    child_of_kind, node_text, Config, NameSource, StubRule, TreeSitterProducer,
};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "import_statement" => StubRule::new(StubKind::Import, NameSource::Field("source")),
    "class_declaration" => StubRule::new(StubKind::Class, NameSource::NAME),
    "function_declaration" => StubRule::new(StubKind::Function, NameSource::NAME),
    "generator_function_declaration" => StubRule::new(StubKind::Function, NameSource::NAME),
    "method_definition" => StubRule::new(StubKind::Method, NameSource::NAME),
    "field_definition" => StubRule::new(StubKind::Field, NameSource::Field("property")),
};

fn decorate(node: Node<'_>, source: &[u8], _kind: &mut StubKind, payload: &mut Payload) {
    if node.kind() == "class_declaration" {
        let base = child_of_kind(node, "class_heritage")
            .and_then(|h| h.named_child(0))
            .and_then(|b| node_text(b, source));
        if let Some(base) = base {
            payload.attributes.insert("extends".to_string(), base);
        }
    }
    if payload.name.starts_with('#') {
        payload
            .attributes
            .insert("visibility".to_string(), "private".to_string());
    }
}

/// Create a new JavaScript producer.
pub fn new_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(Config {
        language: tree_sitter_javascript::LANGUAGE.into(),
        language_name: "javascript",
        rules: &RULES,
        decorate: Some(decorate),
    }))
}

/// Register JavaScript producer for its extensions.
pub fn register() {
    for ext in [".js", ".jsx", ".mjs", ".cjs"] {
        crate::parser::register(ext, new_producer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubTree;
    use std::path::Path;

    #[test]
    fn test_javascript_stubs() {
        let source = br#"
import x from "./x.js";

class Counter extends Base {
    #count = 0;

    constructor() {
        super();
    }

    increment() {
        this.#count++;
    }
}

function main() {}
"#;
        let entries = new_producer()
            .produce(Path::new("counter.mjs"), source)
            .unwrap();
        let tree = StubTree::build(&entries).unwrap();
        let root = tree.root();

        assert_eq!(
            root.find_child_of_type(StubKind::Import).unwrap().name(),
            "./x.js"
        );

        let counter = root.find_child_of_type(StubKind::Class).unwrap();
        assert_eq!(counter.payload().attr("extends"), Some("Base"));

        let field = counter.find_child_of_type(StubKind::Field).unwrap();
        assert_eq!(field.name(), "#count");
        assert_eq!(field.payload().attr("visibility"), Some("private"));

        let methods: Vec<_> = counter
            .children_of_type(StubKind::Method)
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(methods, vec!["constructor", "increment"]);

        assert_eq!(
            root.find_child_of_type(StubKind::Function).unwrap().name(),
            "main"
        );
    }
}
