//! In-memory store backend.
//!
//! Backs the engine's test suite and is handy for dry-run experiments. The
//! backend is single-threaded like the engine itself, so interior
//! mutability through a `RefCell` is sufficient.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use dupsweep_core::{ContentHash, FileId, FileRecord, Folder, FolderId, StoreError};

use crate::Store;

#[derive(Debug, Clone)]
struct FolderEntry {
    meta: Folder,
    trashed: bool,
}

#[derive(Debug, Clone)]
struct FileEntry {
    record: FileRecord,
    parent: FolderId,
}

#[derive(Debug, Default)]
struct Inner {
    folders: HashMap<FolderId, FolderEntry>,
    files: HashMap<FileId, FileEntry>,
    failing_hashes: HashSet<FileId>,
    failing_moves: HashSet<FileId>,
}

/// In-memory [`Store`] implementation.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: RefCell<Inner>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder.
    pub fn add_folder(
        &self,
        id: impl Into<FolderId>,
        parent: Option<FolderId>,
        name: &str,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> FolderId {
        let id = id.into();
        let meta = Folder::new(id.clone(), name, parent, created, modified);
        self.inner.borrow_mut().folders.insert(
            id.clone(),
            FolderEntry {
                meta,
                trashed: false,
            },
        );
        id
    }

    /// Add a file under a parent folder.
    pub fn add_file(
        &self,
        id: impl Into<FileId>,
        parent: &FolderId,
        name: &str,
        size: u64,
        created: DateTime<Utc>,
        hash: Option<&str>,
    ) -> FileId {
        let id = id.into();
        let mut record = FileRecord::new(id.clone(), name, size, created);
        if let Some(digest) = hash {
            record = record.with_hash(ContentHash::new(digest));
        }
        self.inner.borrow_mut().files.insert(
            id.clone(),
            FileEntry {
                record,
                parent: parent.clone(),
            },
        );
        id
    }

    /// Make subsequent digest fetches for a file fail with a metadata
    /// error.
    pub fn fail_hash(&self, id: &FileId) {
        self.inner.borrow_mut().failing_hashes.insert(id.clone());
    }

    /// Make subsequent moves of a file fail with an access error.
    pub fn fail_move(&self, id: &FileId) {
        self.inner.borrow_mut().failing_moves.insert(id.clone());
    }

    /// Whether a file is currently trashed.
    pub fn is_file_trashed(&self, id: &FileId) -> bool {
        self.inner
            .borrow()
            .files
            .get(id)
            .map(|entry| entry.record.trashed)
            .unwrap_or(false)
    }

    /// Whether a folder is currently trashed.
    pub fn is_folder_trashed(&self, id: &FolderId) -> bool {
        self.inner
            .borrow()
            .folders
            .get(id)
            .map(|entry| entry.trashed)
            .unwrap_or(false)
    }

    /// A file's current parent folder.
    pub fn file_parent(&self, id: &FileId) -> Option<FolderId> {
        self.inner
            .borrow()
            .files
            .get(id)
            .map(|entry| entry.parent.clone())
    }

    /// A file's current name.
    pub fn file_name(&self, id: &FileId) -> Option<String> {
        self.inner
            .borrow()
            .files
            .get(id)
            .map(|entry| entry.record.name.to_string())
    }

    /// Number of visible (not trashed) files directly under a folder.
    pub fn visible_file_count(&self, folder: &FolderId) -> usize {
        self.inner
            .borrow()
            .files
            .values()
            .filter(|entry| &entry.parent == folder && !entry.record.trashed)
            .count()
    }

    fn with_file<T>(
        &self,
        id: &FileId,
        f: impl FnOnce(&mut FileEntry) -> T,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.borrow_mut();
        match inner.files.get_mut(id) {
            Some(entry) => Ok(f(entry)),
            None => Err(StoreError::not_found(id.as_str())),
        }
    }
}

impl Store for MemStore {
    fn folder(&self, id: &FolderId) -> Result<Folder, StoreError> {
        self.inner
            .borrow()
            .folders
            .get(id)
            .map(|entry| entry.meta.clone())
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    fn child_folders(&self, id: &FolderId) -> Result<Vec<Folder>, StoreError> {
        let inner = self.inner.borrow();
        if !inner.folders.contains_key(id) {
            return Err(StoreError::not_found(id.as_str()));
        }
        Ok(inner
            .folders
            .values()
            .filter(|entry| !entry.trashed && entry.meta.parent.as_ref() == Some(id))
            .map(|entry| entry.meta.clone())
            .collect())
    }

    fn child_files(&self, id: &FolderId) -> Result<Vec<FileRecord>, StoreError> {
        let inner = self.inner.borrow();
        if !inner.folders.contains_key(id) {
            return Err(StoreError::not_found(id.as_str()));
        }
        Ok(inner
            .files
            .values()
            .filter(|entry| &entry.parent == id)
            .map(|entry| entry.record.clone())
            .collect())
    }

    fn content_hash(&self, id: &FileId) -> Result<Option<ContentHash>, StoreError> {
        let inner = self.inner.borrow();
        if inner.failing_hashes.contains(id) {
            return Err(StoreError::metadata(id.as_str(), "digest fetch failed"));
        }
        match inner.files.get(id) {
            Some(entry) => Ok(entry.record.content_hash.clone()),
            None => Err(StoreError::not_found(id.as_str())),
        }
    }

    fn move_file(
        &self,
        file: &FileId,
        from: &FolderId,
        to: &FolderId,
    ) -> Result<FileId, StoreError> {
        if self.inner.borrow().failing_moves.contains(file) {
            return Err(StoreError::access_denied(file.as_str()));
        }
        self.with_file(file, |entry| {
            if &entry.parent != from {
                return Err(StoreError::other(format!(
                    "file {file} is not in folder {from}"
                )));
            }
            entry.parent = to.clone();
            Ok(file.clone())
        })?
    }

    fn rename_file(&self, file: &FileId, new_name: &str) -> Result<FileId, StoreError> {
        self.with_file(file, |entry| {
            entry.record.name = new_name.into();
            file.clone()
        })
    }

    fn set_file_trashed(&self, file: &FileId, trashed: bool) -> Result<(), StoreError> {
        self.with_file(file, |entry| {
            entry.record.trashed = trashed;
        })
    }

    fn set_folder_trashed(&self, folder: &FolderId, trashed: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        match inner.folders.get_mut(folder) {
            Some(entry) => {
                entry.trashed = trashed;
                Ok(())
            }
            None => Err(StoreError::not_found(folder.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn sample() -> (MemStore, FolderId, FolderId) {
        let store = MemStore::new();
        let root = store.add_folder("root", None, "root", ts(0), ts(0));
        let child = store.add_folder("child", Some(root.clone()), "docs", ts(10), ts(20));
        store.add_file("f1", &child, "a.txt", 4, ts(30), Some("h1"));
        (store, root, child)
    }

    #[test]
    fn test_listing_and_lookup() {
        let (store, root, child) = sample();
        let folders = store.child_folders(&root).unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "docs");

        let files = store.child_files(&child).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
    }

    #[test]
    fn test_trashed_folder_leaves_view() {
        let (store, root, child) = sample();
        store.set_folder_trashed(&child, true).unwrap();
        assert!(store.child_folders(&root).unwrap().is_empty());

        store.set_folder_trashed(&child, false).unwrap();
        assert_eq!(store.child_folders(&root).unwrap().len(), 1);
    }

    #[test]
    fn test_trashed_file_stays_listed_with_flag() {
        let (store, _, child) = sample();
        let id = FileId::new("f1");
        store.set_file_trashed(&id, true).unwrap();

        let files = store.child_files(&child).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].trashed);
    }

    #[test]
    fn test_move_requires_matching_source() {
        let (store, root, child) = sample();
        let id = FileId::new("f1");
        assert!(store.move_file(&id, &root, &child).is_err());

        let moved = store.move_file(&id, &child, &root).unwrap();
        assert_eq!(moved, id);
        assert_eq!(store.file_parent(&id), Some(root));
    }

    #[test]
    fn test_hash_failure_injection() {
        let (store, _, _) = sample();
        let id = FileId::new("f1");
        assert!(store.content_hash(&id).unwrap().is_some());

        store.fail_hash(&id);
        assert!(matches!(
            store.content_hash(&id),
            Err(StoreError::Metadata { .. })
        ));
    }

    #[test]
    fn test_unknown_entities_are_not_found() {
        let store = MemStore::new();
        assert!(matches!(
            store.folder(&FolderId::new("nope")),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.content_hash(&FileId::new("nope")),
            Err(StoreError::NotFound { .. })
        ));
    }
}
