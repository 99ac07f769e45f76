//! Content hashing for structural comparison of elaborated circuits.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 content hash.
///
/// Two elaborations that produce the same `ContentHash` for their circuit and
/// symbol table are treated as structurally identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Hashes a byte slice in one shot.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        write!(f, "ContentHash({short:08x}..)")
    }
}

/// Incremental hasher for building a [`ContentHash`] out of several parts.
///
/// Each part is length-prefixed so that `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
pub struct Fingerprinter {
    state: Xxh3,
}

impl Fingerprinter {
    /// Creates a hasher with an empty state.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Feeds one length-prefixed part.
    pub fn part(&mut self, bytes: &[u8]) -> &mut Self {
        self.state.update(&(bytes.len() as u64).to_le_bytes());
        self.state.update(bytes);
        self
    }

    /// Finishes hashing.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(
            ContentHash::from_bytes(b"circuit"),
            ContentHash::from_bytes(b"circuit")
        );
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = Fingerprinter::new().part(b"ab").part(b"c").finish();
        let b = Fingerprinter::new().part(b"a").part(b"bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprinter_is_repeatable() {
        let mut fp = Fingerprinter::new();
        fp.part(b"stb").part(b"ack");
        assert_eq!(fp.finish(), fp.finish());
    }

    #[test]
    fn display_is_hex() {
        let s = ContentHash::from_bytes(b"x").to_string();
        assert_eq!(s.len(), 32);
        assert!(s.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn survives_json() {
        let hash = ContentHash::from_bytes(b"symtab");
        let text = serde_json::to_string(&hash).unwrap();
        assert_eq!(serde_json::from_str::<ContentHash>(&text).unwrap(), hash);
    }
}
