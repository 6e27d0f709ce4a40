//! Stub discriminants and discriminant sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structural kind of a stub node.
///
/// The set is closed: every kind a producer may emit is listed here, so a
/// registry can be checked for completeness before any tree is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubKind {
    File,
    Module,
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Impl,
    Function,
    Method,
    Field,
    Const,
    TypeAlias,
    Import,
}

impl StubKind {
    /// Every kind, in declaration order.
    pub const ALL: [StubKind; 14] = [
        StubKind::File,
        StubKind::Module,
        StubKind::Class,
        StubKind::Interface,
        StubKind::Struct,
        StubKind::Enum,
        StubKind::Trait,
        StubKind::Impl,
        StubKind::Function,
        StubKind::Method,
        StubKind::Field,
        StubKind::Const,
        StubKind::TypeAlias,
        StubKind::Import,
    ];

    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StubKind::File => "file",
            StubKind::Module => "module",
            StubKind::Class => "class",
            StubKind::Interface => "interface",
            StubKind::Struct => "struct",
            StubKind::Enum => "enum",
            StubKind::Trait => "trait",
            StubKind::Impl => "impl",
            StubKind::Function => "function",
            StubKind::Method => "method",
            StubKind::Field => "field",
            StubKind::Const => "const",
            StubKind::TypeAlias => "type_alias",
            StubKind::Import => "import",
        }
    }

    /// Look up a kind by its string representation.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Kinds that can own methods and fields.
    pub fn is_type_like(&self) -> bool {
        KindSet::TYPES.contains(*self)
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, StubKind::Function | StubKind::Method)
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for StubKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string names no known stub kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stub kind {0:?}")]
pub struct ParseKindError(pub String);

impl FromStr for StubKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// A fixed set of stub kinds, used for membership filters on children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u32);

impl KindSet {
    /// The empty set.
    pub const EMPTY: KindSet = KindSet(0);

    /// Kinds that can own members.
    pub const TYPES: KindSet = KindSet::of(&[
        StubKind::Class,
        StubKind::Interface,
        StubKind::Struct,
        StubKind::Enum,
        StubKind::Trait,
        StubKind::Impl,
    ]);

    /// Functions and methods.
    pub const CALLABLES: KindSet = KindSet::of(&[StubKind::Function, StubKind::Method]);

    /// Build a set from a slice of kinds.
    pub const fn of(kinds: &[StubKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        KindSet(bits)
    }

    pub fn contains(&self, kind: StubKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn with(self, kind: StubKind) -> Self {
        KindSet(self.0 | kind.bit())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = StubKind> + '_ {
        StubKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<StubKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = StubKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::EMPTY, KindSet::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in StubKind::ALL {
            assert_eq!(StubKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!("method".parse::<StubKind>(), Ok(StubKind::Method));
        assert!("widget".parse::<StubKind>().is_err());
    }

    #[test]
    fn test_kind_set_membership() {
        let set = KindSet::of(&[StubKind::Class, StubKind::Field]);
        assert!(set.contains(StubKind::Class));
        assert!(set.contains(StubKind::Field));
        assert!(!set.contains(StubKind::Method));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![StubKind::Class, StubKind::Field]);

        assert!(KindSet::EMPTY.is_empty());
        assert!(StubKind::Impl.is_type_like());
        assert!(!StubKind::Import.is_type_like());
    }

    #[test]
    fn test_kind_set_from_iter() {
        let set: KindSet = [StubKind::Method, StubKind::Function].into_iter().collect();
        assert_eq!(set, KindSet::CALLABLES);
    }
}
