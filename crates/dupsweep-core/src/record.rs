//! File and folder projections.
//!
//! Both types are transient, read-only snapshots of store metadata taken
//! during one pass. The store owns the entities; nothing here is cached
//! across runs.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::id::{ContentHash, FileId, FolderId};

/// Snapshot of one file's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned identifier.
    pub id: FileId,

    /// File name, including any extension.
    pub name: CompactString,

    /// Size in bytes.
    pub size: u64,

    /// Creation timestamp.
    pub created: DateTime<Utc>,

    /// Content digest, absent for formats the store cannot hash.
    pub content_hash: Option<ContentHash>,

    /// Whether the file has been removed from view.
    pub trashed: bool,
}

impl FileRecord {
    /// Create a new visible record without a content hash.
    pub fn new(
        id: FileId,
        name: impl Into<CompactString>,
        size: u64,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            created,
            content_hash: None,
            trashed: false,
        }
    }

    /// Attach a content hash.
    pub fn with_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// Extension after the last dot, if any.
    ///
    /// The split is a literal last-dot split: `"a.tar.gz"` yields `gz` and
    /// `".profile"` yields `profile`.
    pub fn extension(&self) -> Option<&str> {
        match self.name.rfind('.') {
            Some(pos) if pos + 1 < self.name.len() => Some(&self.name[pos + 1..]),
            _ => None,
        }
    }
}

/// Snapshot of one folder's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Store-assigned identifier.
    pub id: FolderId,

    /// Folder name.
    pub name: CompactString,

    /// Parent folder, absent for a store root.
    pub parent: Option<FolderId>,

    /// Creation timestamp.
    pub created: DateTime<Utc>,

    /// Last-modified timestamp.
    pub modified: DateTime<Utc>,
}

impl Folder {
    /// Create a new folder snapshot.
    pub fn new(
        id: FolderId,
        name: impl Into<CompactString>,
        parent: Option<FolderId>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            created,
            modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_extension() {
        let record = |name: &str| FileRecord::new(FileId::new("f"), name, 0, ts(0));
        assert_eq!(record("invoice.pdf").extension(), Some("pdf"));
        assert_eq!(record("archive.tar.gz").extension(), Some("gz"));
        assert_eq!(record("README").extension(), None);
        assert_eq!(record(".profile").extension(), Some("profile"));
        assert_eq!(record("trailing.").extension(), None);
    }

    #[test]
    fn test_with_hash() {
        let record = FileRecord::new(FileId::new("f"), "a.txt", 10, ts(0))
            .with_hash(ContentHash::new("aa"));
        assert_eq!(record.content_hash.as_ref().unwrap().as_str(), "aa");
        assert!(!record.trashed);
    }
}
