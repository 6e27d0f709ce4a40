//! TypeScript language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{
    child_of_kind, node_text, Config, NameSource, StubRule, TreeSitterProducer,
};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "import_statement" => StubRule::new(StubKind::Import, NameSource::Field("source")),
    "internal_module" => StubRule::new(StubKind::Module, NameSource::NAME),
    "class_declaration" => StubRule::new(StubKind::Class, NameSource::NAME),
    "abstract_class_declaration" => StubRule::new(StubKind::Class, NameSource::NAME),
    "interface_declaration" => StubRule::new(StubKind::Interface, NameSource::NAME),
    "enum_declaration" => StubRule::new(StubKind::Enum, NameSource::NAME),
    "type_alias_declaration" => StubRule::new(StubKind::TypeAlias, NameSource::NAME),
    "function_declaration" => StubRule::new(StubKind::Function, NameSource::NAME),
    "generator_function_declaration" => StubRule::new(StubKind::Function, NameSource::NAME),
    "method_definition" => StubRule::new(StubKind::Method, NameSource::NAME),
    "method_signature" => StubRule::new(StubKind::Method, NameSource::NAME),
    "abstract_method_signature" => StubRule::new(StubKind::Method, NameSource::NAME),
    "public_field_definition" => StubRule::new(StubKind::Field, NameSource::NAME),
    "property_signature" => StubRule::new(StubKind::Field, NameSource::NAME),
};

fn decorate(node: Node<'_>, source: &[u8], _kind: &mut StubKind, payload: &mut Payload) {
    if let Some(vis) =
        child_of_kind(node, "accessibility_modifier").and_then(|m| node_text(m, source))
    {
        payload.attributes.insert("visibility".to_string(), vis);
    }

    if matches!(
        node.kind(),
        "class_declaration" | "abstract_class_declaration"
    ) {
        // class_heritage → extends_clause → value
        let base = child_of_kind(node, "class_heritage")
            .and_then(|h| child_of_kind(h, "extends_clause"))
            .and_then(|e| e.child_by_field_name("value"))
            .and_then(|v| node_text(v, source));
        if let Some(base) = base {
            payload.attributes.insert("extends".to_string(), base);
        }
    }

    if node.parent().is_some_and(|p| p.kind() == "export_statement") {
        payload
            .attributes
            .insert("exported".to_string(), "true".to_string());
    }
}

fn config(language: tree_sitter::Language) -> Config {
    Config {
        language,
        language_name: "typescript",
        rules: &RULES,
        decorate: Some(decorate),
    }
}

/// Create a new TypeScript producer.
pub fn new_typescript_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(config(
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    )))
}

/// Create a new TSX producer.
pub fn new_tsx_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(config(
        tree_sitter_typescript::LANGUAGE_TSX.into(),
    )))
}

/// Register TypeScript producers.
pub fn register() {
    crate::parser::register(".ts", new_typescript_producer);
    crate::parser::register(".mts", new_typescript_producer);
    crate::parser::register(".cts", new_typescript_producer);
    crate::parser::register(".tsx", new_tsx_producer);
}
