//! Content fingerprints used to detect stale persisted trees.

use std::fmt;

/// Blake3 hash of a file's source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    pub fn compute(content: &[u8]) -> Self {
        Self(blake3::hash(content))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// Parse a hex string produced by [`to_hex`](Self::to_hex).
    pub fn from_hex(hex: &str) -> Option<Self> {
        blake3::Hash::from_hex(hex).ok().map(Self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_from_content() {
        let content = b"fn main() { println!(\"hello\"); }";
        assert_eq!(Fingerprint::compute(content), Fingerprint::compute(content));
        assert_ne!(
            Fingerprint::compute(content),
            Fingerprint::compute(b"fn main() {}")
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let fp = Fingerprint::compute(b"class A {}");
        assert_eq!(Fingerprint::from_hex(&fp.to_hex()), Some(fp));
        assert_eq!(Fingerprint::from_hex("not-hex"), None);
    }
}
