//! Run statistics.
//!
//! Counters are monotone and carry no decision logic. They aggregate
//! bottom-up: per folder, then per root, then across the whole run. In a
//! dry run the counters reflect what would have happened.

use serde::{Deserialize, Serialize};

use crate::error::SweepWarning;

/// Counters for the folder-merge phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeStats {
    /// Duplicate folder groups fully processed.
    pub groups_merged: u64,
    /// Files relocated into a surviving folder without a name collision.
    pub files_moved: u64,
    /// Colliding files moved under a generated unique name.
    pub files_renamed: u64,
    /// Colliding same-content files resolved by trashing one side.
    pub duplicates_handled: u64,
    /// Emptied source folders removed from view.
    pub folders_removed: u64,
    /// Bytes of trashed duplicates.
    pub bytes_freed: u64,
    /// Non-fatal diagnostics recorded during the phase.
    pub warnings: Vec<SweepWarning>,
}

impl MergeStats {
    /// Fold another phase result into this one.
    pub fn absorb(&mut self, other: MergeStats) {
        self.groups_merged += other.groups_merged;
        self.files_moved += other.files_moved;
        self.files_renamed += other.files_renamed;
        self.duplicates_handled += other.duplicates_handled;
        self.folders_removed += other.folders_removed;
        self.bytes_freed += other.bytes_freed;
        self.warnings.extend(other.warnings);
    }
}

/// Counters for the per-folder dedup phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderStats {
    /// Visible files seen in the folder.
    pub files_seen: u64,
    /// Files dropped by the age or extension prefilters, before any hash
    /// lookup.
    pub files_filtered: u64,
    /// Files left out of dedup because no content hash was available.
    pub files_skipped: u64,
    /// Accidental duplicates trashed.
    pub files_trashed: u64,
    /// Bytes of trashed duplicates.
    pub bytes_freed: u64,
    /// Non-fatal diagnostics recorded during analysis.
    pub warnings: Vec<SweepWarning>,
}

impl FolderStats {
    /// Fold another folder's counters into this one.
    pub fn absorb(&mut self, other: FolderStats) {
        self.files_seen += other.files_seen;
        self.files_filtered += other.files_filtered;
        self.files_skipped += other.files_skipped;
        self.files_trashed += other.files_trashed;
        self.bytes_freed += other.bytes_freed;
        self.warnings.extend(other.warnings);
    }
}

/// Aggregated result of processing one root, or a whole run across roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootStats {
    /// Folder-merge counters.
    pub merge: MergeStats,
    /// Dedup counters summed over visited folders.
    pub dedup: FolderStats,
    /// Folders entered during the dedup phase.
    pub folders_visited: u64,
    /// Whether the run stopped early because the execution budget expired.
    pub budget_exhausted: bool,
}

impl RootStats {
    /// Fold another root's result into this one.
    pub fn absorb(&mut self, other: RootStats) {
        self.merge.absorb(other.merge);
        self.dedup.absorb(other.dedup);
        self.folders_visited += other.folders_visited;
        self.budget_exhausted |= other.budget_exhausted;
    }

    /// Total bytes freed across both phases.
    pub fn bytes_freed(&self) -> u64 {
        self.merge.bytes_freed + self.dedup.bytes_freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    #[test]
    fn test_absorb_sums_counters() {
        let mut total = RootStats::default();
        total.absorb(RootStats {
            merge: MergeStats {
                files_moved: 2,
                bytes_freed: 10,
                ..Default::default()
            },
            dedup: FolderStats {
                files_trashed: 3,
                bytes_freed: 30,
                warnings: vec![SweepWarning::new("f", "m", WarningKind::HashUnavailable)],
                ..Default::default()
            },
            folders_visited: 4,
            budget_exhausted: false,
        });
        total.absorb(RootStats {
            folders_visited: 1,
            budget_exhausted: true,
            ..Default::default()
        });

        assert_eq!(total.merge.files_moved, 2);
        assert_eq!(total.dedup.files_trashed, 3);
        assert_eq!(total.folders_visited, 5);
        assert_eq!(total.bytes_freed(), 40);
        assert_eq!(total.dedup.warnings.len(), 1);
        assert!(total.budget_exhausted);
    }
}
