//! Local-filesystem store backend.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

use dupsweep_core::{ContentHash, FileId, FileRecord, Folder, FolderId, StoreError};

use crate::Store;

/// [`Store`] backend over a local directory tree.
///
/// Identifiers are paths relative to the root, with the empty string naming
/// the root itself. Moves and renames therefore change identity; both
/// operations return the new identifier. Content digests are streaming
/// BLAKE3 hex strings. Trashing goes through the platform trash, which has
/// no by-path restore, so clearing a trashed flag is unsupported here.
///
/// Symlinked directories are not listed; a path-addressed backend cannot
/// tell a link cycle apart from a plain subtree.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let root = root
            .canonicalize()
            .map_err(|e| io_error(&root.display().to_string(), e))?;
        if !root.is_dir() {
            return Err(StoreError::other(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// The identifier of the root folder.
    pub fn root_folder(&self) -> FolderId {
        FolderId::new("")
    }

    fn abs(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    fn folder_meta(&self, id: &FolderId, path: &Path) -> Result<Folder, StoreError> {
        let meta = fs::metadata(path).map_err(|e| io_error(id.as_str(), e))?;
        if !meta.is_dir() {
            return Err(StoreError::not_found(id.as_str()));
        }
        let modified = meta
            .modified()
            .map_err(|e| StoreError::metadata(id.as_str(), e.to_string()))?;
        let created = meta.created().unwrap_or(modified);
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => "/".to_string(),
        };
        let parent = if id.as_str().is_empty() {
            None
        } else {
            Some(FolderId::new(
                path.parent().map(|p| self.rel(p)).unwrap_or_default(),
            ))
        };
        Ok(Folder::new(
            id.clone(),
            name,
            parent,
            to_utc(created),
            to_utc(modified),
        ))
    }
}

impl Store for FsStore {
    fn folder(&self, id: &FolderId) -> Result<Folder, StoreError> {
        self.folder_meta(id, &self.abs(id.as_str()))
    }

    fn child_folders(&self, id: &FolderId) -> Result<Vec<Folder>, StoreError> {
        let path = self.abs(id.as_str());
        let entries = fs::read_dir(&path).map_err(|e| io_error(id.as_str(), e))?;

        let mut folders = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() || file_type.is_symlink() {
                continue;
            }
            let child_path = entry.path();
            let child_id = FolderId::new(self.rel(&child_path));
            match self.folder_meta(&child_id, &child_path) {
                Ok(folder) => folders.push(folder),
                Err(err) => debug!(folder = %child_id, %err, "skipping unreadable folder entry"),
            }
        }
        Ok(folders)
    }

    fn child_files(&self, id: &FolderId) -> Result<Vec<FileRecord>, StoreError> {
        let path = self.abs(id.as_str());
        let entries = fs::read_dir(&path).map_err(|e| io_error(id.as_str(), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let child_path = entry.path();
            let Ok(meta) = entry.metadata() else { continue };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let created = meta.created().unwrap_or(modified);
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(FileRecord::new(
                FileId::new(self.rel(&child_path)),
                name,
                meta.len(),
                to_utc(created),
            ));
        }
        Ok(files)
    }

    fn content_hash(&self, id: &FileId) -> Result<Option<ContentHash>, StoreError> {
        let path = self.abs(id.as_str());
        let mut file =
            File::open(&path).map_err(|e| StoreError::metadata(id.as_str(), e.to_string()))?;

        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .map_err(|e| StoreError::metadata(id.as_str(), e.to_string()))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(Some(ContentHash::new(
            hasher.finalize().to_hex().to_string(),
        )))
    }

    fn move_file(
        &self,
        file: &FileId,
        from: &FolderId,
        to: &FolderId,
    ) -> Result<FileId, StoreError> {
        let old = self.abs(file.as_str());
        if old.parent() != Some(self.abs(from.as_str()).as_path()) {
            return Err(StoreError::other(format!(
                "file {file} is not in folder {from}"
            )));
        }
        let name = old
            .file_name()
            .ok_or_else(|| StoreError::other(format!("file {file} has no name")))?;
        let new = self.abs(to.as_str()).join(name);
        if new.exists() {
            return Err(StoreError::other(format!(
                "destination already holds {}",
                new.display()
            )));
        }
        fs::rename(&old, &new).map_err(|e| io_error(file.as_str(), e))?;
        debug!(from = %old.display(), to = %new.display(), "moved file");
        Ok(FileId::new(self.rel(&new)))
    }

    fn rename_file(&self, file: &FileId, new_name: &str) -> Result<FileId, StoreError> {
        let old = self.abs(file.as_str());
        let parent = old
            .parent()
            .ok_or_else(|| StoreError::other(format!("file {file} has no parent")))?;
        let new = parent.join(new_name);
        if new.exists() {
            return Err(StoreError::other(format!(
                "destination already holds {}",
                new.display()
            )));
        }
        fs::rename(&old, &new).map_err(|e| io_error(file.as_str(), e))?;
        debug!(from = %old.display(), to = %new.display(), "renamed file");
        Ok(FileId::new(self.rel(&new)))
    }

    fn set_file_trashed(&self, file: &FileId, trashed: bool) -> Result<(), StoreError> {
        if !trashed {
            return Err(StoreError::other(
                "the filesystem backend cannot restore from trash",
            ));
        }
        let path = self.abs(file.as_str());
        trash::delete(&path).map_err(|e| StoreError::other(e.to_string()))?;
        debug!(path = %path.display(), "trashed file");
        Ok(())
    }

    fn set_folder_trashed(&self, folder: &FolderId, trashed: bool) -> Result<(), StoreError> {
        if !trashed {
            return Err(StoreError::other(
                "the filesystem backend cannot restore from trash",
            ));
        }
        let path = self.abs(folder.as_str());
        trash::delete(&path).map_err(|e| StoreError::other(e.to_string()))?;
        debug!(path = %path.display(), "trashed folder");
        Ok(())
    }
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

fn io_error(entity: &str, source: std::io::Error) -> StoreError {
    match source.kind() {
        std::io::ErrorKind::PermissionDenied => StoreError::access_denied(entity),
        std::io::ErrorKind::NotFound => StoreError::not_found(entity),
        _ => StoreError::other(format!("{entity}: {source}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, FsStore) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("docs")).unwrap();
        fs::create_dir(root.join("pics")).unwrap();
        fs::write(root.join("docs/a.txt"), "same content").unwrap();
        fs::write(root.join("docs/b.txt"), "same content").unwrap();
        fs::write(root.join("docs/c.txt"), "different").unwrap();
        let store = FsStore::new(root).unwrap();
        (temp, store)
    }

    #[test]
    fn test_listings() {
        let (_temp, store) = sandbox();
        let root = store.root_folder();

        let mut folders = store.child_folders(&root).unwrap();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].name, "docs");

        let files = store.child_files(&folders[0].id).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| !f.trashed));
    }

    #[test]
    fn test_content_hash_matches_for_identical_bytes() {
        let (_temp, store) = sandbox();
        let a = store.content_hash(&FileId::new("docs/a.txt")).unwrap();
        let b = store.content_hash(&FileId::new("docs/b.txt")).unwrap();
        let c = store.content_hash(&FileId::new("docs/c.txt")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_move_and_rename_return_new_identity() {
        let (_temp, store) = sandbox();
        let docs = FolderId::new("docs");
        let pics = FolderId::new("pics");

        let id = FileId::new("docs/a.txt");
        let renamed = store.rename_file(&id, "a (2).txt").unwrap();
        assert_eq!(renamed.as_str(), "docs/a (2).txt");

        let moved = store.move_file(&renamed, &docs, &pics).unwrap();
        assert_eq!(moved.as_str(), "pics/a (2).txt");
        assert!(store.content_hash(&moved).unwrap().is_some());
    }

    #[test]
    fn test_move_rejects_wrong_source_folder() {
        let (_temp, store) = sandbox();
        let pics = FolderId::new("pics");
        let result = store.move_file(&FileId::new("docs/a.txt"), &pics, &pics);
        assert!(result.is_err());
    }

    #[test]
    fn test_restore_is_unsupported() {
        let (_temp, store) = sandbox();
        assert!(
            store
                .set_file_trashed(&FileId::new("docs/a.txt"), false)
                .is_err()
        );
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let (_temp, store) = sandbox();
        assert!(matches!(
            store.child_folders(&FolderId::new("missing")),
            Err(StoreError::NotFound { .. })
        ));
    }
}
