//! Go language configuration for tree-sitter parsing.

use phf::phf_map;
use tree_sitter::Node;

use crate::parser::treesitter::{node_text, Config, NameSource, StubRule, TreeSitterProducer};
use crate::parser::StubProducer;
use crate::stub::{Payload, StubKind};

/// `type_spec` is emitted as a type alias and refined by [`decorate`] once
/// the underlying type is known.
static RULES: phf::Map<&'static str, StubRule> = phf_map! {
    "package_clause" => StubRule::new(StubKind::Module, NameSource::FirstNamedChild),
    "import_spec" => StubRule::new(StubKind::Import, NameSource::Field("path")),
    "function_declaration" => StubRule::new(StubKind::Function, NameSource::NAME),
    "method_declaration" => StubRule::new(StubKind::Method, NameSource::NAME),
    "type_spec" => StubRule::new(StubKind::TypeAlias, NameSource::NAME),
    "type_alias" => StubRule::new(StubKind::TypeAlias, NameSource::NAME),
    "field_declaration" => StubRule::new(StubKind::Field, NameSource::NAME),
    "method_elem" => StubRule::new(StubKind::Method, NameSource::NAME),
    "method_spec" => StubRule::new(StubKind::Method, NameSource::NAME),
    "const_spec" => StubRule::new(StubKind::Const, NameSource::NAME),
};

/// Receiver type name without pointer or type parameters: `(c *Cache[K])` → `Cache`.
fn receiver_type(node: Node<'_>, source: &[u8]) -> Option<String> {
    let params = node.child_by_field_name("receiver")?;
    let param = params.named_child(0)?;
    let ty = node_text(param.child_by_field_name("type")?, source)?;
    let ty = ty.trim_start_matches('*');
    let base = ty.split('[').next().unwrap_or(ty).trim();
    (!base.is_empty()).then(|| base.to_string())
}

fn decorate(node: Node<'_>, source: &[u8], kind: &mut StubKind, payload: &mut Payload) {
    match node.kind() {
        "type_spec" => {
            *kind = match node.child_by_field_name("type").map(|t| t.kind()) {
                Some("struct_type") => StubKind::Struct,
                Some("interface_type") => StubKind::Interface,
                _ => StubKind::TypeAlias,
            };
        }
        "method_declaration" => {
            if let Some(recv) = receiver_type(node, source) {
                payload.attributes.insert("receiver".to_string(), recv);
            }
        }
        "import_spec" => {
            if let Some(alias) = node
                .child_by_field_name("name")
                .and_then(|a| node_text(a, source))
            {
                payload.attributes.insert("alias".to_string(), alias);
            }
            return;
        }
        "package_clause" => return,
        _ => {}
    }

    // Exported identifiers start with an upper-case letter.
    if payload.name.chars().next().is_some_and(char::is_uppercase) {
        payload
            .attributes
            .insert("visibility".to_string(), "exported".to_string());
    }
}

/// Create a new Go producer.
pub fn new_producer() -> Box<dyn StubProducer> {
    Box::new(TreeSitterProducer::new(Config {
        language: tree_sitter_go::LANGUAGE.into(),
        language_name: "go",
        rules: &RULES,
        decorate: Some(decorate),
    }))
}

/// Register Go producer for .go extension.
pub fn register() {
    crate::parser::register(".go", new_producer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubTree;
    use std::path::Path;

    #[test]
    fn test_go_stubs() {
        let source = br#"
package main

import (
    "fmt"
    str "strings"
)

const Version = "1.0"

type Config struct {
    Name string
}

type Runner interface {
    Run() error
}

type ID = string

func (c *Config) Validate() error {
    return nil
}

func main() {
    fmt.Println("hello")
}
"#;

        let entries = new_producer()
            .produce(Path::new("main.go"), source)
            .unwrap();
        let tree = StubTree::build(&entries).unwrap();
        let root = tree.root();

        let module = root.find_child_of_type(StubKind::Module).unwrap();
        assert_eq!(module.name(), "main");

        let imports: Vec<_> = tree
            .refs_of_type(StubKind::Import)
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(imports, vec!["fmt", "strings"]);
        let aliased = tree.refs_of_type(StubKind::Import).nth(1).unwrap();
        assert_eq!(aliased.payload().attr("alias"), Some("str"));

        let version = root.find_child_of_type(StubKind::Const).unwrap();
        assert_eq!(version.name(), "Version");
        assert_eq!(version.payload().attr("visibility"), Some("exported"));

        let config = root.find_child_of_type(StubKind::Struct).unwrap();
        assert_eq!(config.name(), "Config");
        assert_eq!(config.children_of_type(StubKind::Field).len(), 1);

        let runner = root.find_child_of_type(StubKind::Interface).unwrap();
        assert_eq!(runner.name(), "Runner");

        let alias = root.find_child_of_type(StubKind::TypeAlias).unwrap();
        assert_eq!(alias.name(), "ID");

        let validate = root.find_child_of_type(StubKind::Method).unwrap();
        assert_eq!(validate.name(), "Validate");
        assert_eq!(validate.payload().attr("receiver"), Some("Config"));

        let main = root.find_child_of_type(StubKind::Function).unwrap();
        assert_eq!(main.name(), "main");
        assert_eq!(main.payload().attr("visibility"), None);
    }
}
