//! Identities that let equivalent search requests collapse into one.

use std::fmt;

use serde::Serialize;

use crate::stub::StubKind;

/// One component of a request identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum IdentityValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for IdentityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityValue::Text(s) => write!(f, "{:?}", s),
            IdentityValue::Int(i) => write!(f, "{}", i),
            IdentityValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for IdentityValue {
    fn from(s: &str) -> Self {
        IdentityValue::Text(s.to_string())
    }
}

impl From<String> for IdentityValue {
    fn from(s: String) -> Self {
        IdentityValue::Text(s)
    }
}

impl From<i64> for IdentityValue {
    fn from(i: i64) -> Self {
        IdentityValue::Int(i)
    }
}

impl From<bool> for IdentityValue {
    fn from(b: bool) -> Self {
        IdentityValue::Bool(b)
    }
}

impl From<StubKind> for IdentityValue {
    fn from(kind: StubKind) -> Self {
        IdentityValue::Text(kind.as_str().to_string())
    }
}

/// Ordered value sequence fixed at construction.
///
/// Two identities are equal iff their sequences are equal element by
/// element, and the hash follows the same sequence, so an identity can key
/// a `HashMap` or `HashSet` directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestIdentity(Vec<IdentityValue>);

impl RequestIdentity {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<IdentityValue>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn values(&self) -> &[IdentityValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("]")
    }
}
