//! Store and clock capabilities for dupsweep.
//!
//! The decision engine never talks to a concrete storage system. It
//! consumes the [`Store`] trait: a narrow, synchronous capability set for
//! listing, metadata retrieval and reversible mutation. Calls are issued
//! strictly sequentially by the engine, so implementations need no internal
//! locking beyond what their own state requires.
//!
//! Two backends ship with the workspace:
//!
//! - [`MemStore`] - an in-memory backend for tests and experiments
//! - [`FsStore`] - a local-filesystem backend rooted at a directory
//!
//! A remote-store client implements the same trait elsewhere; it is not
//! part of this workspace.

mod fs;
mod mem;

use chrono::{DateTime, Utc};

use dupsweep_core::{ContentHash, FileId, FileRecord, Folder, FolderId, StoreError};

pub use fs::FsStore;
pub use mem::MemStore;

/// Narrow capability interface onto a hierarchical file store.
///
/// Listings make no ordering guarantee; callers that need determinism must
/// impose their own stable order. Trashed folders are removed from view and
/// never listed; trashed files are listed with their flag set so callers
/// can filter.
pub trait Store {
    /// Fetch one folder's metadata.
    fn folder(&self, id: &FolderId) -> Result<Folder, StoreError>;

    /// List the child folders of a folder, excluding trashed ones.
    fn child_folders(&self, id: &FolderId) -> Result<Vec<Folder>, StoreError>;

    /// List the child files of a folder, including trashed ones.
    fn child_files(&self, id: &FolderId) -> Result<Vec<FileRecord>, StoreError>;

    /// Fetch a file's content digest.
    ///
    /// Returns `Ok(None)` for formats the store cannot hash. A failed fetch
    /// is a metadata error; callers treat it the same as an absent digest.
    fn content_hash(&self, id: &FileId) -> Result<Option<ContentHash>, StoreError>;

    /// Move a file between folders, keeping its name and content.
    ///
    /// Returns the file's identity after the move. Stores with stable
    /// identities return it unchanged; path-addressed backends return the
    /// new identity.
    fn move_file(
        &self,
        file: &FileId,
        from: &FolderId,
        to: &FolderId,
    ) -> Result<FileId, StoreError>;

    /// Rename a file in place. Returns the identity after the rename.
    fn rename_file(&self, file: &FileId, new_name: &str) -> Result<FileId, StoreError>;

    /// Set or clear a file's trashed flag. Trashing is reversible removal
    /// from view, never permanent deletion.
    fn set_file_trashed(&self, file: &FileId, trashed: bool) -> Result<(), StoreError>;

    /// Set or clear a folder's trashed flag.
    fn set_folder_trashed(&self, folder: &FolderId, trashed: bool) -> Result<(), StoreError>;
}

/// Source of the current time.
pub trait Clock {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant, for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
