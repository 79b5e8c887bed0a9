//! Per-folder content dedup.
//!
//! Within one folder, files sharing a content digest are reduced to the
//! earliest-created copy. A same-content file is only treated as an
//! accidental duplicate when it was created within the duplication window
//! of the group's earliest member; older identical copies are kept as
//! intentional.

use tracing::{debug, info, warn};

use dupsweep_core::{FolderId, FolderStats, SweepConfig, SweepWarning};
use dupsweep_store::{Clock, Store};

use crate::group::group_files_by_hash;

/// Analyze one folder and trash its accidental duplicates.
///
/// The age and extension filters run before any digest lookup, so excluded
/// files are never hashed. Files whose digest cannot be obtained leave
/// dedup consideration and are counted as skipped, never analyzed. In
/// dry-run mode only the trash call is suppressed; classification and
/// logging still happen and the counters reflect what would happen.
pub fn deduplicate_folder<S: Store, C: Clock>(
    store: &S,
    folder: &FolderId,
    config: &SweepConfig,
    clock: &C,
) -> FolderStats {
    let mut stats = FolderStats::default();

    let files = match store.child_files(folder) {
        Ok(files) => files,
        Err(err) => {
            warn!(%folder, %err, "folder unreachable, skipping");
            stats
                .warnings
                .push(SweepWarning::folder_unreachable(folder.as_str(), &err));
            return stats;
        }
    };

    let visible: Vec<_> = files.into_iter().filter(|f| !f.trashed).collect();
    stats.files_seen = visible.len() as u64;

    let cutoff = config.age_cutoff(clock.now());
    let mut eligible = Vec::new();
    for record in visible {
        if let Some(cutoff) = cutoff {
            if record.created < cutoff {
                stats.files_filtered += 1;
                continue;
            }
        }
        if config.is_extension_excluded(&record) {
            stats.files_filtered += 1;
            continue;
        }
        eligible.push(record);
    }

    let mut hashed = Vec::new();
    for record in eligible {
        let hash = match &record.content_hash {
            Some(hash) => Some(hash.clone()),
            None => match store.content_hash(&record.id) {
                Ok(hash) => hash,
                Err(err) => {
                    stats
                        .warnings
                        .push(SweepWarning::hash_unavailable(record.id.as_str(), &err));
                    None
                }
            },
        };
        match hash {
            Some(hash) => hashed.push((record, hash)),
            None => stats.files_skipped += 1,
        }
    }

    let window = config.duplication_window();
    for (hash, group) in group_files_by_hash(hashed) {
        if group.len() < 2 {
            continue;
        }
        // The earliest-created member is retained unconditionally; every
        // other member is measured against it, not against its
        // predecessor.
        let earliest = group[0].created;
        for member in &group[1..] {
            let delta = member.created - earliest;
            if delta > window {
                debug!(file = %member.name, digest = %hash,
                       "identical content outside the window, keeping intentional copy");
                continue;
            }
            if config.dry_run {
                info!(file = %member.name, %folder, digest = %hash,
                      "would trash accidental duplicate");
            } else {
                if let Err(err) = store.set_file_trashed(&member.id, true) {
                    stats
                        .warnings
                        .push(SweepWarning::file_unreachable(member.id.as_str(), &err));
                    continue;
                }
                info!(file = %member.name, %folder, digest = %hash,
                      "trashed accidental duplicate");
            }
            stats.files_trashed += 1;
            stats.bytes_freed += member.size;
        }
    }

    stats
}
