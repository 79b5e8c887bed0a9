//! Opaque identifiers for store entities.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Unique identifier of a file within the store.
///
/// Identifiers are opaque strings assigned by the store; the engine never
/// inspects their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(CompactString);

impl FileId {
    /// Create a new FileId from a string.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier of a folder within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderId(CompactString);

impl FolderId {
    /// Create a new FolderId from a string.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Content digest reported by the store.
///
/// Two files sharing a digest are considered byte-identical. The digest
/// format is store-defined and treated as opaque; the engine only ever
/// compares digests for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(CompactString);

impl ContentHash {
    /// Create a new ContentHash from a digest string.
    pub fn new(digest: impl Into<CompactString>) -> Self {
        Self(digest.into())
    }

    /// Get the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(digest: &str) -> Self {
        Self::new(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = FileId::new("f-42");
        assert_eq!(id.as_str(), "f-42");
        assert_eq!(id.to_string(), "f-42");
    }

    #[test]
    fn test_ids_are_ordered() {
        let mut ids = vec![FolderId::new("b"), FolderId::new("a"), FolderId::new("c")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
        assert_eq!(ids[2].as_str(), "c");
    }

    #[test]
    fn test_content_hash_equality() {
        assert_eq!(ContentHash::new("abcd"), ContentHash::from("abcd"));
        assert_ne!(ContentHash::new("abcd"), ContentHash::new("abce"));
    }
}
