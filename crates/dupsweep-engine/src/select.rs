//! Survivor selection for duplicate folder groups.

use std::collections::{HashSet, VecDeque};

use tracing::warn;

use dupsweep_core::{FolderId, KeepStrategy};
use dupsweep_scan::FolderNode;
use dupsweep_store::Store;

/// Choose which member of a duplicate group survives the merge.
///
/// Returns the index of the survivor; all other members become merge
/// sources. Ties fall to the first member in input order for every
/// strategy. That is deterministic because scans sort child listings by
/// identity before grouping.
pub fn select_survivor<S: Store>(
    store: &S,
    group: &[FolderNode],
    strategy: KeepStrategy,
) -> usize {
    debug_assert!(!group.is_empty());
    let mut best = 0;
    match strategy {
        KeepStrategy::Oldest => {
            for (index, node) in group.iter().enumerate().skip(1) {
                if node.folder.created < group[best].folder.created {
                    best = index;
                }
            }
        }
        KeepStrategy::Newest => {
            for (index, node) in group.iter().enumerate().skip(1) {
                if node.folder.modified > group[best].folder.modified {
                    best = index;
                }
            }
        }
        KeepStrategy::MostFiles => {
            let counts: Vec<u64> = group
                .iter()
                .map(|node| recursive_file_count(store, &node.folder.id))
                .collect();
            for (index, count) in counts.iter().enumerate().skip(1) {
                if *count > counts[best] {
                    best = index;
                }
            }
        }
    }
    best
}

/// Count visible files in a folder and all of its descendants.
///
/// The count is always fully recursive, independent of any scan recursion
/// limit. The walk carries a visited set so reference cycles terminate;
/// unreadable subtrees contribute zero and are logged, never fatal.
pub fn recursive_file_count<S: Store>(store: &S, root: &FolderId) -> u64 {
    let mut count = 0u64;
    let mut visited: HashSet<FolderId> = HashSet::new();
    let mut queue: VecDeque<FolderId> = VecDeque::from([root.clone()]);

    while let Some(folder) = queue.pop_front() {
        if !visited.insert(folder.clone()) {
            continue;
        }
        match store.child_files(&folder) {
            Ok(files) => count += files.iter().filter(|f| !f.trashed).count() as u64,
            Err(err) => warn!(%folder, %err, "file count skipping unreadable folder"),
        }
        match store.child_folders(&folder) {
            Ok(children) => queue.extend(children.into_iter().map(|c| c.id)),
            Err(err) => warn!(%folder, %err, "file count skipping unreachable subtree"),
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dupsweep_core::Folder;
    use dupsweep_store::MemStore;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn node(id: &str, created: i64, modified: i64) -> FolderNode {
        FolderNode {
            folder: Folder::new(
                FolderId::new(id),
                "acme",
                Some(FolderId::new("p")),
                ts(created),
                ts(modified),
            ),
            depth: 1,
            path: "/acme".to_string(),
        }
    }

    #[test]
    fn test_oldest_picks_min_creation() {
        let store = MemStore::new();
        let group = vec![node("1", 50, 0), node("2", 10, 0), node("3", 30, 0)];
        assert_eq!(select_survivor(&store, &group, KeepStrategy::Oldest), 1);
    }

    #[test]
    fn test_newest_picks_max_modification() {
        let store = MemStore::new();
        let group = vec![node("1", 0, 50), node("2", 0, 90), node("3", 0, 30)];
        assert_eq!(select_survivor(&store, &group, KeepStrategy::Newest), 1);
    }

    #[test]
    fn test_ties_fall_to_first_in_input_order() {
        let store = MemStore::new();
        let group = vec![node("1", 10, 10), node("2", 10, 10), node("3", 10, 10)];
        assert_eq!(select_survivor(&store, &group, KeepStrategy::Oldest), 0);
        assert_eq!(select_survivor(&store, &group, KeepStrategy::Newest), 0);
        assert_eq!(select_survivor(&store, &group, KeepStrategy::MostFiles), 0);
    }

    #[test]
    fn test_most_files_counts_recursively() {
        let store = MemStore::new();
        let parent = store.add_folder("p", None, "parent", ts(0), ts(0));
        let one = store.add_folder("1", Some(parent.clone()), "Acme", ts(0), ts(0));
        let two = store.add_folder("2", Some(parent), "acme", ts(0), ts(0));
        let nested = store.add_folder("2n", Some(two.clone()), "inner", ts(0), ts(0));

        store.add_file("a", &one, "a", 1, ts(0), None);
        store.add_file("b", &one, "b", 1, ts(0), None);
        store.add_file("c", &two, "c", 1, ts(0), None);
        store.add_file("d", &nested, "d", 1, ts(0), None);
        store.add_file("e", &nested, "e", 1, ts(0), None);

        // Folder 2 holds 1 direct file but 3 recursively.
        let group = vec![node("1", 0, 0), node("2", 0, 0)];
        assert_eq!(select_survivor(&store, &group, KeepStrategy::MostFiles), 1);
        assert_eq!(recursive_file_count(&store, &FolderId::new("1")), 2);
        assert_eq!(recursive_file_count(&store, &FolderId::new("2")), 3);
    }

    #[test]
    fn test_trashed_files_do_not_count() {
        let store = MemStore::new();
        let folder = store.add_folder("f", None, "f", ts(0), ts(0));
        let file = store.add_file("a", &folder, "a", 1, ts(0), None);
        store.set_file_trashed(&file, true).unwrap();
        assert_eq!(recursive_file_count(&store, &folder), 0);
    }
}
