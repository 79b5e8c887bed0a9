//! Pure partition steps for both phases. No I/O.

use indexmap::IndexMap;

use dupsweep_core::{ContentHash, FileRecord, FolderId};
use dupsweep_scan::FolderNode;

/// Key identifying same-named sibling folders: parent identity plus
/// lowercased name.
pub type SiblingKey = (FolderId, String);

/// Partition scanned folders into same-named sibling groups.
///
/// Folders without a parent cannot be merged and are not grouped. Groups
/// preserve first-encountered order; a group of size one is not actionable
/// and is ignored by consumers.
pub fn group_sibling_folders(nodes: Vec<FolderNode>) -> IndexMap<SiblingKey, Vec<FolderNode>> {
    let mut groups: IndexMap<SiblingKey, Vec<FolderNode>> = IndexMap::new();
    for node in nodes {
        let Some(parent) = node.folder.parent.clone() else {
            continue;
        };
        let key = (parent, node.folder.name.as_str().to_lowercase());
        groups.entry(key).or_default().push(node);
    }
    groups
}

/// Partition files by content digest.
///
/// Each group is ordered by ascending creation time, with identity as the
/// tie-break so the order is stable regardless of listing order.
pub fn group_files_by_hash(
    files: Vec<(FileRecord, ContentHash)>,
) -> IndexMap<ContentHash, Vec<FileRecord>> {
    let mut groups: IndexMap<ContentHash, Vec<FileRecord>> = IndexMap::new();
    for (record, hash) in files {
        groups.entry(hash).or_default().push(record);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dupsweep_core::{FileId, Folder};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn node(id: &str, parent: Option<&str>, name: &str) -> FolderNode {
        FolderNode {
            folder: Folder::new(
                FolderId::new(id),
                name,
                parent.map(FolderId::new),
                ts(0),
                ts(0),
            ),
            depth: 1,
            path: format!("/{name}"),
        }
    }

    #[test]
    fn test_sibling_grouping_is_case_insensitive() {
        let nodes = vec![
            node("1", Some("p"), "Acme"),
            node("2", Some("p"), "acme"),
            node("3", Some("p"), "Other"),
            node("4", Some("q"), "acme"),
        ];
        let groups = group_sibling_folders(nodes);
        assert_eq!(groups.len(), 3);

        let key = (FolderId::new("p"), "acme".to_string());
        let group = &groups[&key];
        assert_eq!(group.len(), 2);
        // First-encountered order is preserved.
        assert_eq!(group[0].folder.id.as_str(), "1");
    }

    #[test]
    fn test_parentless_folders_are_not_grouped() {
        let groups = group_sibling_folders(vec![node("1", None, "root")]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_hash_groups_order_by_creation_then_id() {
        let record = |id: &str, secs: i64| FileRecord::new(FileId::new(id), "f", 1, ts(secs));
        let hash = ContentHash::new("h");
        let files = vec![
            (record("b", 5), hash.clone()),
            (record("a", 5), hash.clone()),
            (record("c", 1), hash.clone()),
        ];
        let groups = group_files_by_hash(files);
        let group = &groups[&hash];
        let ids: Vec<&str> = group.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
