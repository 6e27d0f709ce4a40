//! Java language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{
    child_of_kind, node_text, Config, NameSource, StubRule, TreeSitterProducer,
};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

const DECLARATOR_NAME: NameSource = NameSource::FieldPath(&["declarator", "name"]);

static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "package_declaration" => StubRule::new(StubKind::Module, NameSource::FirstNamedChild),
    "import_declaration" => StubRule::new(StubKind::Import, NameSource::FirstNamedChild),
    "class_declaration" => StubRule::new(StubKind::Class, NameSource::NAME),
    "record_declaration" => StubRule::new(StubKind::Class, NameSource::NAME),
    "interface_declaration" => StubRule::new(StubKind::Interface, NameSource::NAME),
    "annotation_type_declaration" => StubRule::new(StubKind::Interface, NameSource::NAME),
    "enum_declaration" => StubRule::new(StubKind::Enum, NameSource::NAME),
    "method_declaration" => StubRule::new(StubKind::Method, NameSource::NAME),
    "constructor_declaration" => StubRule::new(StubKind::Method, NameSource::NAME),
    "field_declaration" => StubRule::new(StubKind::Field, DECLARATOR_NAME),
    "constant_declaration" => StubRule::new(StubKind::Const, DECLARATOR_NAME),
};

const VISIBILITY: [&str; 3] = ["public", "protected", "private"];

fn decorate(node: Node<'_>, source: &[u8], kind: &mut StubKind, payload: &mut Payload) {
    if let Some(modifiers) = child_of_kind(node, "modifiers").and_then(|m| node_text(m, source)) {
        let words: Vec<&str> = modifiers.split(' ').collect();
        if let Some(vis) = VISIBILITY.iter().find(|v| words.contains(*v)) {
            payload
                .attributes
                .insert("visibility".to_string(), vis.to_string());
        }
        if *kind == StubKind::Field && words.contains(&"static") && words.contains(&"final") {
            *kind = StubKind::Const;
        }
        payload.attributes.insert("modifiers".to_string(), modifiers);
    }

    match node.kind() {
        "class_declaration" => {
            let superclass = node
                .child_by_field_name("superclass")
                .and_then(|s| s.named_child(0))
                .and_then(|t| node_text(t, source));
            if let Some(superclass) = superclass {
                payload.attributes.insert("extends".to_string(), superclass);
            }
        }
        "import_declaration" => {
            if child_of_kind(node, "asterisk").is_some() {
                payload.name.push_str(".*");
            }
            let text = node_text(node, source).unwrap_or_default();
            if text.starts_with("import static ") {
                payload
                    .attributes
                    .insert("static".to_string(), "true".to_string());
            }
        }
        _ => {}
    }
}

/// Create a new Java producer.
pub fn new_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(Config {
        language: tree_sitter_java::LANGUAGE.into(),
        language_name: "java",
        rules: &RULES,
        decorate: Some(decorate),
    }))
}

/// Register Java producer for .java extension.
pub fn register() {
    crate::parser::register(".java", new_producer);
}
