//! Phase orchestration across folders and roots.
//!
//! Each invocation runs the folder-merge phase first, then the per-folder
//! dedup phase, in that fixed order. The execution budget gates entry into
//! each duplicate group, folder and root; once a unit is entered it always
//! completes.

use itertools::Itertools;
use rand::seq::SliceRandom;
use tracing::info;

use dupsweep_core::{
    Folder, FolderId, MergeStats, RootStats, SweepConfig, SweepError, SweepWarning, VisitPriority,
};
use dupsweep_scan::TreeScanner;
use dupsweep_store::{Clock, Store};

use crate::budget::ExecutionBudget;
use crate::dedup::deduplicate_folder;
use crate::group::group_sibling_folders;
use crate::merge::MergeExecutor;
use crate::select::select_survivor;

/// Merge all duplicate sibling-folder groups under a root.
///
/// Scans the subtree (honoring the exclusion set and the recursion
/// toggle), groups same-named siblings, picks a survivor per group and
/// merges the rest into it. Once a group has been fully merged a later run
/// finds no duplicate group at that key and performs no work there.
pub fn merge_duplicate_folders<S: Store>(
    store: &S,
    root: &FolderId,
    config: &SweepConfig,
    budget: &ExecutionBudget,
) -> MergeStats {
    merge_phase(store, root, config, budget).0
}

fn merge_phase<S: Store>(
    store: &S,
    root: &FolderId,
    config: &SweepConfig,
    budget: &ExecutionBudget,
) -> (MergeStats, bool) {
    let mut stats = MergeStats::default();

    let outcome = TreeScanner::new(store).scan(
        root,
        &config.excluded_folders,
        config.merge_recursive,
    );
    stats.warnings.extend(outcome.warnings);

    let executor = MergeExecutor::new(store, config);
    let mut stopped = false;

    for ((parent, name), group) in group_sibling_folders(outcome.folders) {
        if group.len() < 2 {
            continue;
        }
        if budget.expired() {
            info!(elapsed = ?budget.elapsed(), "budget exhausted, leaving remaining groups");
            stopped = true;
            break;
        }

        let survivor = select_survivor(store, &group, config.keep_strategy);
        let target = &group[survivor];
        let sources: Vec<_> = group
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != survivor)
            .map(|(_, node)| node)
            .collect();

        info!(%name, %parent, survivor = %target.folder.id, sources = sources.len(),
              "merging duplicate sibling folders");
        executor.merge_group(target, &sources, &mut stats);
        stats.groups_merged += 1;
    }

    (stats, stopped)
}

/// Run both phases over one root.
///
/// Phase 2 covers the root folder itself and its immediate subfolders, in
/// the configured visit order.
pub fn process_root<S: Store, C: Clock>(
    store: &S,
    root: &FolderId,
    config: &SweepConfig,
    budget: &ExecutionBudget,
    clock: &C,
) -> RootStats {
    let mut stats = RootStats::default();

    if config.merge_enabled {
        if budget.expired() {
            stats.budget_exhausted = true;
            return stats;
        }
        let (merge_stats, stopped) = merge_phase(store, root, config, budget);
        stats.merge = merge_stats;
        stats.budget_exhausted |= stopped;
    }

    let mut folders: Vec<Folder> = Vec::new();
    match store.folder(root) {
        Ok(folder) => folders.push(folder),
        Err(err) => {
            stats
                .dedup
                .warnings
                .push(SweepWarning::folder_unreachable(root.as_str(), &err));
        }
    }
    match store.child_folders(root) {
        Ok(children) => folders.extend(order_folders(children, config.visit_priority)),
        Err(err) => {
            stats
                .dedup
                .warnings
                .push(SweepWarning::folder_unreachable(root.as_str(), &err));
        }
    }

    for folder in folders {
        if config.is_folder_excluded(&folder.id) {
            continue;
        }
        if budget.expired() {
            info!(elapsed = ?budget.elapsed(), "budget exhausted, leaving remaining folders");
            stats.budget_exhausted = true;
            break;
        }
        let folder_stats = deduplicate_folder(store, &folder.id, config, clock);
        stats.folders_visited += 1;
        stats.dedup.absorb(folder_stats);
    }

    stats
}

/// Run both phases over a list of roots under one shared budget.
///
/// An empty root list is the one fatal input: it aborts the invocation
/// before any mutating call is issued. Failures inside one root never
/// abort its siblings.
pub fn process_roots<S: Store, C: Clock>(
    store: &S,
    roots: &[FolderId],
    config: &SweepConfig,
    clock: &C,
) -> Result<RootStats, SweepError> {
    if roots.is_empty() {
        return Err(SweepError::invalid_config("the root folder list is empty"));
    }

    let budget = ExecutionBudget::starting_now(config.max_runtime());
    let mut total = RootStats::default();

    for root in roots {
        if budget.expired() {
            total.budget_exhausted = true;
            break;
        }
        total.absorb(process_root(store, root, config, &budget, clock));
    }

    info!(
        folders = total.folders_visited,
        moved = total.merge.files_moved,
        renamed = total.merge.files_renamed,
        trashed = total.merge.duplicates_handled + total.dedup.files_trashed,
        bytes = total.bytes_freed(),
        exhausted = total.budget_exhausted,
        dry_run = config.dry_run,
        "run complete"
    );
    Ok(total)
}

/// Order folders for Phase 2 visits.
///
/// Recency-first visits the most recently modified folders before the
/// budget runs out; random ordering spreads coverage across repeated
/// partial runs. Recency ties break by identity so the order is stable.
fn order_folders(folders: Vec<Folder>, priority: VisitPriority) -> Vec<Folder> {
    match priority {
        VisitPriority::RecencyFirst => folders
            .into_iter()
            .sorted_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.cmp(&b.id)))
            .collect(),
        VisitPriority::Random => {
            let mut folders = folders;
            folders.shuffle(&mut rand::thread_rng());
            folders
        }
    }
}
