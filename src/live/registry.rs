//! Stub kind → live-node factory table.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Element, LiveNode};
use crate::error::{Result, StubError};
use crate::stub::{KindSet, StubKind, StubRef};

/// Turns a stub into the semantic content of its live node.
pub type StubFactory = Arc<dyn Fn(StubRef<'_>) -> anyhow::Result<Element> + Send + Sync>;

/// Explicit table of factories, one per stub kind.
pub struct TypeRegistry {
    factories: HashMap<StubKind, StubFactory>,
}

static STANDARD: Lazy<TypeRegistry> = Lazy::new(|| TypeRegistry::builder().with_standard().build());

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Registry with the built-in factory for every kind.
    pub fn standard() -> &'static TypeRegistry {
        &STANDARD
    }

    pub fn contains(&self, kind: StubKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Registered kinds.
    pub fn kinds(&self) -> KindSet {
        self.factories.keys().copied().collect()
    }

    /// Run the factory for `stub`'s kind.
    pub fn materialize(&self, stub: StubRef<'_>) -> Result<LiveNode> {
        let kind = stub.kind();
        let factory = self
            .factories
            .get(&kind)
            .ok_or(StubError::UnknownKind(kind))?;
        let element = factory(stub).map_err(|source| StubError::Materialization {
            kind,
            id: stub.id(),
            source,
        })?;
        Ok(LiveNode::new(stub, element))
    }
}

#[derive(Default)]
pub struct TypeRegistryBuilder {
    factories: HashMap<StubKind, StubFactory>,
}

impl TypeRegistryBuilder {
    /// Register a factory, replacing any previous one for `kind`.
    pub fn register<F>(mut self, kind: StubKind, factory: F) -> Self
    where
        F: Fn(StubRef<'_>) -> anyhow::Result<Element> + Send + Sync + 'static,
    {
        self.factories.insert(kind, Arc::new(factory));
        self
    }

    /// Fill every kind that has no factory yet with the built-in one.
    pub fn with_standard(mut self) -> Self {
        let standard: StubFactory = Arc::new(standard_factory);
        for kind in StubKind::ALL {
            self.factories
                .entry(kind)
                .or_insert_with(|| Arc::clone(&standard));
        }
        self
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            factories: self.factories,
        }
    }

    /// Build, failing if any kind in `required` has no factory.
    pub fn build_covering(self, required: &KindSet) -> Result<TypeRegistry> {
        if let Some(missing) = required.iter().find(|k| !self.factories.contains_key(k)) {
            return Err(StubError::UnknownKind(missing));
        }
        Ok(self.build())
    }
}

fn required_name(stub: StubRef<'_>) -> anyhow::Result<String> {
    let name = stub.name();
    if name.is_empty() {
        anyhow::bail!("{} stub has no name", stub.kind());
    }
    Ok(name.to_string())
}

fn attr(stub: StubRef<'_>, key: &str) -> Option<String> {
    stub.payload().attr(key).map(str::to_string)
}

/// Built-in interpretation of producer payloads.
fn standard_factory(stub: StubRef<'_>) -> anyhow::Result<Element> {
    let element = match stub.kind() {
        StubKind::File => Element::File {
            name: stub.name().to_string(),
            language: attr(stub, "language"),
        },
        StubKind::Module => Element::Module {
            name: required_name(stub)?,
        },
        StubKind::Class
        | StubKind::Interface
        | StubKind::Struct
        | StubKind::Enum
        | StubKind::Trait
        | StubKind::Impl
        | StubKind::TypeAlias => Element::Type {
            name: required_name(stub)?,
            visibility: attr(stub, "visibility"),
            supertype: attr(stub, "extends").or_else(|| attr(stub, "trait")),
        },
        StubKind::Function | StubKind::Method => Element::Callable {
            name: required_name(stub)?,
            receiver: attr(stub, "receiver"),
            visibility: attr(stub, "visibility"),
        },
        StubKind::Field | StubKind::Const => Element::Variable {
            name: required_name(stub)?,
            constant: stub.kind() == StubKind::Const,
            visibility: attr(stub, "visibility"),
        },
        StubKind::Import => Element::Import {
            path: required_name(stub)?,
            alias: attr(stub, "alias"),
        },
    };
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{Payload, StubEntry, StubTree};

    fn tree() -> StubTree {
        StubTree::build(&[
            StubEntry::new(
                StubKind::File,
                Payload::new("lib.rs").with_attr("language", "rust"),
                0,
            ),
            StubEntry::new(StubKind::Impl, Payload::new("Parser").with_attr("trait", "Default"), 1),
            StubEntry::new(
                StubKind::Method,
                Payload::new("default").with_attr("receiver", "Parser"),
                2,
            ),
            StubEntry::new(StubKind::Import, Payload::new(""), 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_standard_factories() {
        let tree = tree();
        let registry = TypeRegistry::standard();

        let file = tree.root().live(registry).unwrap();
        assert_eq!(
            file.element(),
            &Element::File {
                name: "lib.rs".to_string(),
                language: Some("rust".to_string())
            }
        );

        let method = tree.refs_of_type(StubKind::Method).next().unwrap();
        let live = method.live(registry).unwrap();
        assert_eq!(live.kind(), StubKind::Method);
        assert_eq!(live.name(), "default");
        assert_eq!(live.parent_id(), method.parent().map(|p| p.id()));
        assert!(matches!(
            live.element(),
            Element::Callable { receiver: Some(r), .. } if r == "Parser"
        ));

        let imp = method.parent().unwrap().live(registry).unwrap();
        assert!(matches!(
            imp.element(),
            Element::Type { supertype: Some(s), .. } if s == "Default"
        ));
    }

    #[test]
    fn test_unnamed_stub_is_rejected_by_factory() {
        let tree = tree();
        let import = tree.nodes_of_type(StubKind::Import)[0];
        let err = tree.get_live(import, TypeRegistry::standard()).unwrap_err();
        assert!(matches!(
            err,
            StubError::Materialization {
                kind: StubKind::Import,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_kind_is_configuration_fault() {
        let registry = TypeRegistry::builder().build();
        let tree = tree();
        let err = tree.root().live(&registry).unwrap_err();
        assert!(matches!(err, StubError::UnknownKind(StubKind::File)));
    }

    #[test]
    fn test_build_covering_detects_gaps_early() {
        let required = KindSet::of(&[StubKind::Class, StubKind::Method]);
        let partial = TypeRegistry::builder().register(StubKind::Class, |stub| {
            Ok(Element::Module {
                name: stub.name().to_string(),
            })
        });
        assert!(matches!(
            partial.build_covering(&required),
            Err(StubError::UnknownKind(StubKind::Method))
        ));

        let full = TypeRegistry::builder()
            .with_standard()
            .build_covering(&required)
            .unwrap();
        assert_eq!(full.kinds(), StubKind::ALL.into_iter().collect::<KindSet>());
    }
}
