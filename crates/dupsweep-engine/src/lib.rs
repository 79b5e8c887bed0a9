//! The dupsweep decision engine.
//!
//! Consolidates duplicate content inside a hierarchical file store in two
//! fixed phases per invocation:
//!
//! 1. **Folder merge** - same-named sibling folders are collapsed into one
//!    survivor, with every file-name collision reconciled by content.
//! 2. **Content dedup** - within each folder, files sharing a content
//!    digest and created close together in time are reduced to the
//!    earliest copy.
//!
//! The engine is single-threaded and cooperative: store calls are issued
//! strictly sequentially, and a wall-clock [`ExecutionBudget`] is checked
//! between whole-folder units of work. Every destructive effect is a
//! reversible trash operation; the engine defines no permanent-delete
//! path.
//!
//! ```rust,ignore
//! use dupsweep_core::SweepConfig;
//! use dupsweep_engine::process_roots;
//! use dupsweep_store::{FsStore, SystemClock};
//!
//! let store = FsStore::new("/path/to/tree")?;
//! let config = SweepConfig::builder().dry_run(true).build()?;
//! let stats = process_roots(&store, &[store.root_folder()], &config, &SystemClock)?;
//! println!("would free {} bytes", stats.bytes_freed());
//! ```

mod budget;
mod dedup;
mod group;
mod merge;
mod run;
mod select;

pub use budget::ExecutionBudget;
pub use dedup::deduplicate_folder;
pub use group::{SiblingKey, group_files_by_hash, group_sibling_folders};
pub use merge::MergeExecutor;
pub use run::{merge_duplicate_folders, process_root, process_roots};
pub use select::{recursive_file_count, select_survivor};
