//! Folder-merge execution.
//!
//! Relocates files out of losing folders into the surviving folder,
//! resolving every name collision, then removes emptied sources from view.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use dupsweep_core::{ContentHash, FileRecord, MergeStats, SweepConfig, SweepWarning};
use dupsweep_scan::FolderNode;
use dupsweep_store::Store;

/// How one incoming file is reconciled against the survivor folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeDecision {
    /// Same content within the window, existing copy is at least as old:
    /// trash the incoming file in place.
    KeepExisting,
    /// Same content within the window, incoming copy is older: trash the
    /// existing file and move the incoming one in under its own name.
    ReplaceExisting,
    /// Different or unknown content, or same content far apart in time:
    /// move the incoming file in under a generated unique name.
    RenameIncoming,
}

/// Resolve a name collision between an existing target file and an
/// incoming source file.
///
/// An absent digest on either side means content equality cannot be
/// established, so the incoming file is preserved under a new name. The
/// same applies when digests match but the copies are further apart than
/// the duplication window: identical content that old is treated as an
/// intentional separate copy.
fn resolve_collision(
    existing: &FileRecord,
    incoming: &FileRecord,
    existing_hash: Option<&ContentHash>,
    incoming_hash: Option<&ContentHash>,
    window: chrono::Duration,
) -> MergeDecision {
    let (Some(existing_hash), Some(incoming_hash)) = (existing_hash, incoming_hash) else {
        return MergeDecision::RenameIncoming;
    };
    if existing_hash != incoming_hash {
        return MergeDecision::RenameIncoming;
    }

    let delta = (incoming.created - existing.created).abs();
    if delta > window {
        return MergeDecision::RenameIncoming;
    }
    if existing.created <= incoming.created {
        MergeDecision::KeepExisting
    } else {
        MergeDecision::ReplaceExisting
    }
}

/// Pick the first " (2)", " (3)", ... variant of a name not yet taken.
///
/// The name is split into stem and extension at the last dot. Every
/// candidate is checked against the full set of names currently present in
/// the target, so the returned name cannot collide.
fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(pos) => (&name[..pos], Some(&name[pos..])),
        None => (name, None),
    };

    let mut counter = 2u32;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem} ({counter}){ext}"),
            None => format!("{stem} ({counter})"),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Executes folder merges against a store.
pub struct MergeExecutor<'a, S: Store> {
    store: &'a S,
    config: &'a SweepConfig,
}

impl<'a, S: Store> MergeExecutor<'a, S> {
    /// Create an executor.
    pub fn new(store: &'a S, config: &'a SweepConfig) -> Self {
        Self { store, config }
    }

    /// Merge every source folder into the target, in the given order.
    ///
    /// In dry-run mode every decision and log line still happens, but no
    /// mutating call is issued; the counters reflect what would happen.
    pub fn merge_group(
        &self,
        target: &FolderNode,
        sources: &[&FolderNode],
        stats: &mut MergeStats,
    ) {
        let target_id = &target.folder.id;
        let mut target_files: HashMap<String, FileRecord> = match self.store.child_files(target_id)
        {
            Ok(files) => files
                .into_iter()
                .filter(|f| !f.trashed)
                .map(|f| (f.name.to_string(), f))
                .collect(),
            Err(err) => {
                stats
                    .warnings
                    .push(SweepWarning::folder_unreachable(target_id.as_str(), &err));
                return;
            }
        };
        let mut taken: HashSet<String> = target_files.keys().cloned().collect();

        for &source in sources {
            let source_id = &source.folder.id;
            let files = match self.store.child_files(source_id) {
                Ok(files) => files,
                Err(err) => {
                    stats
                        .warnings
                        .push(SweepWarning::folder_unreachable(source_id.as_str(), &err));
                    continue;
                }
            };
            let mut files: Vec<FileRecord> = files.into_iter().filter(|f| !f.trashed).collect();
            files.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

            let mut all_resolved = true;
            for file in files {
                let resolved = match target_files.get(file.name.as_str()) {
                    None => self.move_in(&file, source, target, &mut target_files, &mut taken, stats),
                    Some(existing) => {
                        let existing = existing.clone();
                        self.reconcile(
                            &existing,
                            &file,
                            source,
                            target,
                            &mut target_files,
                            &mut taken,
                            stats,
                        )
                    }
                };
                all_resolved &= resolved;
            }

            self.remove_if_emptied(source, all_resolved, stats);
        }
    }

    /// Relocate a file that has no name collision in the target.
    fn move_in(
        &self,
        file: &FileRecord,
        source: &FolderNode,
        target: &FolderNode,
        target_files: &mut HashMap<String, FileRecord>,
        taken: &mut HashSet<String>,
        stats: &mut MergeStats,
    ) -> bool {
        if !self.config.dry_run {
            if let Err(err) =
                self.store
                    .move_file(&file.id, &source.folder.id, &target.folder.id)
            {
                stats
                    .warnings
                    .push(SweepWarning::file_unreachable(file.id.as_str(), &err));
                return false;
            }
        }
        info!(file = %file.name, from = %source.path, to = %target.path, "moved file");
        stats.files_moved += 1;
        taken.insert(file.name.to_string());
        target_files.insert(file.name.to_string(), file.clone());
        true
    }

    /// Resolve a collision between `existing` in the target and `incoming`
    /// in the source.
    #[allow(clippy::too_many_arguments)]
    fn reconcile(
        &self,
        existing: &FileRecord,
        incoming: &FileRecord,
        source: &FolderNode,
        target: &FolderNode,
        target_files: &mut HashMap<String, FileRecord>,
        taken: &mut HashSet<String>,
        stats: &mut MergeStats,
    ) -> bool {
        let existing_hash = self.hash_of(existing, stats);
        let incoming_hash = self.hash_of(incoming, stats);
        let decision = resolve_collision(
            existing,
            incoming,
            existing_hash.as_ref(),
            incoming_hash.as_ref(),
            self.config.duplication_window(),
        );

        match decision {
            MergeDecision::KeepExisting => {
                if !self.config.dry_run {
                    if let Err(err) = self.store.set_file_trashed(&incoming.id, true) {
                        stats
                            .warnings
                            .push(SweepWarning::file_unreachable(incoming.id.as_str(), &err));
                        return false;
                    }
                }
                info!(file = %incoming.name, folder = %source.path,
                      "trashed incoming duplicate, kept existing copy");
                stats.duplicates_handled += 1;
                stats.bytes_freed += incoming.size;
                true
            }
            MergeDecision::ReplaceExisting => {
                if !self.config.dry_run {
                    if let Err(err) = self.store.set_file_trashed(&existing.id, true) {
                        stats
                            .warnings
                            .push(SweepWarning::file_unreachable(existing.id.as_str(), &err));
                        return false;
                    }
                    if let Err(err) =
                        self.store
                            .move_file(&incoming.id, &source.folder.id, &target.folder.id)
                    {
                        stats
                            .warnings
                            .push(SweepWarning::file_unreachable(incoming.id.as_str(), &err));
                        return false;
                    }
                }
                info!(file = %incoming.name, folder = %target.path,
                      "replaced existing copy with older incoming duplicate");
                stats.duplicates_handled += 1;
                stats.bytes_freed += existing.size;
                target_files.insert(incoming.name.to_string(), incoming.clone());
                true
            }
            MergeDecision::RenameIncoming => {
                let new_name = unique_name(&incoming.name, taken);
                if !self.config.dry_run {
                    let renamed = match self.store.rename_file(&incoming.id, &new_name) {
                        Ok(id) => id,
                        Err(err) => {
                            stats
                                .warnings
                                .push(SweepWarning::file_unreachable(incoming.id.as_str(), &err));
                            return false;
                        }
                    };
                    if let Err(err) =
                        self.store
                            .move_file(&renamed, &source.folder.id, &target.folder.id)
                    {
                        stats
                            .warnings
                            .push(SweepWarning::file_unreachable(renamed.as_str(), &err));
                        return false;
                    }
                }
                info!(file = %incoming.name, renamed = %new_name, to = %target.path,
                      "moved colliding file under a new name");
                stats.files_renamed += 1;
                let mut record = incoming.clone();
                record.name = new_name.clone().into();
                taken.insert(new_name.clone());
                target_files.insert(new_name, record);
                true
            }
        }
    }

    /// Fetch a file's digest, treating any fetch failure as absent.
    fn hash_of(&self, file: &FileRecord, stats: &mut MergeStats) -> Option<ContentHash> {
        if let Some(hash) = &file.content_hash {
            return Some(hash.clone());
        }
        match self.store.content_hash(&file.id) {
            Ok(hash) => hash,
            Err(err) => {
                debug!(file = %file.id, %err, "digest fetch failed, treating as absent");
                stats
                    .warnings
                    .push(SweepWarning::hash_unavailable(file.id.as_str(), &err));
                None
            }
        }
    }

    /// Remove a source folder from view once it holds nothing at all.
    ///
    /// A source that still contains subfolders is kept, even when those
    /// subfolders are empty: with non-recursive merging they were never
    /// visited, so removing them would discard unexamined structure.
    fn remove_if_emptied(&self, source: &FolderNode, all_resolved: bool, stats: &mut MergeStats) {
        let source_id = &source.folder.id;

        let no_subfolders = match self.store.child_folders(source_id) {
            Ok(children) => children.is_empty(),
            Err(_) => false,
        };

        let removable = if self.config.dry_run {
            // Nothing was actually moved; the simulated outcome empties the
            // source exactly when every file was resolved.
            all_resolved && no_subfolders
        } else {
            let no_files = match self.store.child_files(source_id) {
                Ok(files) => files.iter().all(|f| f.trashed),
                Err(_) => false,
            };
            no_files && no_subfolders
        };

        if !removable {
            debug!(folder = %source.path, "source not emptied, keeping");
            return;
        }

        if !self.config.dry_run {
            if let Err(err) = self.store.set_folder_trashed(source_id, true) {
                stats
                    .warnings
                    .push(SweepWarning::folder_unreachable(source_id.as_str(), &err));
                return;
            }
        }
        info!(folder = %source.path, "removed emptied source folder");
        stats.folders_removed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use dupsweep_core::FileId;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn record(id: &str, name: &str, created_hours: i64) -> FileRecord {
        FileRecord::new(FileId::new(id), name, 100, ts(created_hours * 3600))
    }

    #[test]
    fn test_unique_name_with_extension() {
        let taken = HashSet::from(["invoice.pdf".to_string()]);
        assert_eq!(unique_name("invoice.pdf", &taken), "invoice (2).pdf");
    }

    #[test]
    fn test_unique_name_probes_past_taken_suffixes() {
        let taken: HashSet<String> = [
            "invoice.pdf",
            "invoice (2).pdf",
            "invoice (3).pdf",
            "invoice (4).pdf",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(unique_name("invoice.pdf", &taken), "invoice (5).pdf");
    }

    #[test]
    fn test_unique_name_without_extension() {
        let taken = HashSet::from(["notes".to_string()]);
        assert_eq!(unique_name("notes", &taken), "notes (2)");
    }

    #[test]
    fn test_collision_same_content_keeps_older_existing() {
        let existing = record("e", "invoice.pdf", 0);
        let incoming = record("i", "invoice.pdf", 2);
        let hash = ContentHash::new("h");
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&hash),
            Some(&hash),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::KeepExisting);
    }

    #[test]
    fn test_collision_same_content_replaces_newer_existing() {
        let existing = record("e", "invoice.pdf", 5);
        let incoming = record("i", "invoice.pdf", 2);
        let hash = ContentHash::new("h");
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&hash),
            Some(&hash),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::ReplaceExisting);
    }

    #[test]
    fn test_collision_different_content_renames() {
        let existing = record("e", "invoice.pdf", 0);
        let incoming = record("i", "invoice.pdf", 1);
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&ContentHash::new("h1")),
            Some(&ContentHash::new("h2")),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::RenameIncoming);
    }

    #[test]
    fn test_collision_missing_hash_renames() {
        let existing = record("e", "invoice.pdf", 0);
        let incoming = record("i", "invoice.pdf", 1);
        let decision = resolve_collision(
            &existing,
            &incoming,
            None,
            Some(&ContentHash::new("h")),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::RenameIncoming);
    }

    #[test]
    fn test_collision_outside_window_renames_despite_same_content() {
        let existing = record("e", "invoice.pdf", 0);
        let incoming = record("i", "invoice.pdf", 30);
        let hash = ContentHash::new("h");
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&hash),
            Some(&hash),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::RenameIncoming);
    }

    #[test]
    fn test_collision_exactly_at_window_is_within() {
        let existing = record("e", "invoice.pdf", 0);
        let incoming = record("i", "invoice.pdf", 24);
        let hash = ContentHash::new("h");
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&hash),
            Some(&hash),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::KeepExisting);
    }

    #[test]
    fn test_collision_equal_creation_keeps_existing() {
        let existing = record("e", "invoice.pdf", 3);
        let incoming = record("i", "invoice.pdf", 3);
        let hash = ContentHash::new("h");
        let decision = resolve_collision(
            &existing,
            &incoming,
            Some(&hash),
            Some(&hash),
            Duration::hours(24),
        );
        assert_eq!(decision, MergeDecision::KeepExisting);
    }
}
