//! Folder-tree scanning for dupsweep.
//!
//! Walks a store's folder hierarchy breadth-first, honoring an exclusion
//! set at the subtree boundary and an optional recursion limit. The scan is
//! cycle-safe: a visited-identity set guards against stores that can, in
//! principle, contain reference cycles.

mod scanner;

pub use scanner::{FolderNode, ScanOutcome, TreeScanner};
