//! Breadth-first traversal of a store's folder tree.

use std::collections::{HashSet, VecDeque};

use tracing::warn;

use dupsweep_core::{Folder, FolderId, SweepWarning};
use dupsweep_store::Store;

/// A folder discovered by a scan.
///
/// Depth and path are diagnostics for logging; they play no role in
/// grouping or selection.
#[derive(Debug, Clone)]
pub struct FolderNode {
    /// The folder's store metadata.
    pub folder: Folder,
    /// Distance from the scan root.
    pub depth: u32,
    /// Materialized path from the scan root.
    pub path: String,
}

/// Result of one scan: discovered folders in traversal order, plus the
/// non-fatal diagnostics collected along the way.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Folders in breadth-first order, children sorted by identity.
    pub folders: Vec<FolderNode>,
    /// Subtrees skipped because their folder was unreachable.
    pub warnings: Vec<SweepWarning>,
}

/// Breadth-first folder scanner.
///
/// Child listings are sorted by folder identity before anything downstream
/// sees them: the store's own ordering is unspecified, and every
/// first-encountered tie-break in the engine relies on this stable order.
pub struct TreeScanner<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> TreeScanner<'a, S> {
    /// Create a scanner over a store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Scan the subtree rooted at `root`.
    ///
    /// Exclusion is enforced at the boundary: an excluded folder is never
    /// enqueued, so no descendant of it is visited or reported, whether or
    /// not the descendant's own identity appears in the set. An excluded
    /// root yields an empty outcome.
    ///
    /// With `recursive` off, each discovered folder still has its direct
    /// children listed, but those children are not expanded further.
    pub fn scan(
        &self,
        root: &FolderId,
        excluded: &HashSet<FolderId>,
        recursive: bool,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        if excluded.contains(root) {
            return outcome;
        }

        let root_folder = match self.store.folder(root) {
            Ok(folder) => folder,
            Err(err) => {
                warn!(folder = %root, %err, "scan root unreachable");
                outcome
                    .warnings
                    .push(SweepWarning::folder_unreachable(root.as_str(), &err));
                return outcome;
            }
        };

        let mut visited: HashSet<FolderId> = HashSet::new();
        let mut queue: VecDeque<FolderNode> = VecDeque::new();
        queue.push_back(FolderNode {
            path: format!("/{}", root_folder.name),
            depth: 0,
            folder: root_folder,
        });

        while let Some(node) = queue.pop_front() {
            // Guards against stores with reference cycles.
            if !visited.insert(node.folder.id.clone()) {
                continue;
            }

            let expand = recursive || node.depth < 2;
            if expand {
                match self.store.child_folders(&node.folder.id) {
                    Ok(mut children) => {
                        children.sort_by(|a, b| a.id.cmp(&b.id));
                        for child in children {
                            if excluded.contains(&child.id) {
                                continue;
                            }
                            queue.push_back(FolderNode {
                                path: format!("{}/{}", node.path, child.name),
                                depth: node.depth + 1,
                                folder: child,
                            });
                        }
                    }
                    Err(err) => {
                        warn!(folder = %node.folder.id, path = %node.path, %err,
                              "skipping unreachable subtree");
                        outcome.warnings.push(SweepWarning::folder_unreachable(
                            node.folder.id.as_str(),
                            &err,
                        ));
                    }
                }
            }

            outcome.folders.push(node);
        }

        outcome
    }
}
