//! dupsweep - consolidates duplicate content in a directory tree.
//!
//! Usage:
//!   dsw [PATH]               Dry-run sweep of PATH (default: current dir)
//!   dsw --apply [PATH]       Actually move and trash files
//!   dsw --format json [PATH] Machine-readable summary
//!   dsw --help               Show all options

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::Result;
use humansize::{DECIMAL, format_size};
use tracing_subscriber::EnvFilter;

use dupsweep_core::{FolderId, KeepStrategy, RootStats, SweepConfig, VisitPriority};
use dupsweep_engine::process_roots;
use dupsweep_store::{FsStore, SystemClock};

#[derive(Parser)]
#[command(
    name = "dupsweep",
    version,
    about = "Consolidates duplicate files and merges same-named sibling folders",
    long_about = "dupsweep removes redundant same-content files created close together in \
                  time and merges same-named sibling folders, reconciling any name \
                  collisions.\n\nBy default nothing is changed: every decision is logged \
                  and summarized. Pass --apply to move and trash files for real. All \
                  removals go to the system trash and can be restored from there."
)]
struct Cli {
    /// Directory tree to sweep (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Actually move and trash files (default is a dry run)
    #[arg(long)]
    apply: bool,

    /// Same-content files this many hours apart still count as accidental
    /// duplicates
    #[arg(long, default_value_t = 24, value_name = "HOURS")]
    window: i64,

    /// Wall-clock budget in seconds; the sweep stops scheduling folders
    /// once it runs out
    #[arg(long, default_value_t = 300, value_name = "SECS")]
    max_runtime: u64,

    /// Only analyze files created within this many days (0 disables the
    /// filter)
    #[arg(long, default_value_t = 0, value_name = "DAYS")]
    max_age_days: u32,

    /// File extension to leave alone (lowercase, no dot; repeatable)
    #[arg(long = "exclude-ext", value_name = "EXT")]
    exclude_ext: Vec<String>,

    /// Subdirectory of PATH to leave alone, subtree included (repeatable)
    #[arg(long = "exclude", value_name = "DIR")]
    exclude: Vec<String>,

    /// Skip the sibling-folder merge phase
    #[arg(long)]
    no_merge: bool,

    /// Merge same-named folders across the whole subtree instead of a
    /// single level
    #[arg(short, long)]
    recursive: bool,

    /// Which of several same-named sibling folders survives a merge
    #[arg(long, value_enum, default_value_t = KeepArg::Oldest)]
    keep: KeepArg,

    /// Folder visit order within the time budget
    #[arg(long, value_enum, default_value_t = PriorityArg::Recency)]
    priority: PriorityArg,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KeepArg {
    Oldest,
    Newest,
    MostFiles,
}

impl From<KeepArg> for KeepStrategy {
    fn from(arg: KeepArg) -> Self {
        match arg {
            KeepArg::Oldest => KeepStrategy::Oldest,
            KeepArg::Newest => KeepStrategy::Newest,
            KeepArg::MostFiles => KeepStrategy::MostFiles,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    Recency,
    Random,
}

impl From<PriorityArg> for VisitPriority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Recency => VisitPriority::RecencyFirst,
            PriorityArg::Random => VisitPriority::Random,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let store = FsStore::new(&cli.path)?;
    let config = SweepConfig::builder()
        .duplication_window_hours(cli.window)
        .max_runtime_secs(cli.max_runtime)
        .max_file_age_days(cli.max_age_days)
        .excluded_extensions(cli.exclude_ext.into_iter().collect::<HashSet<_>>())
        .excluded_folders(
            cli.exclude
                .iter()
                .map(|dir| FolderId::new(dir.as_str()))
                .collect::<HashSet<_>>(),
        )
        .merge_enabled(!cli.no_merge)
        .merge_recursive(cli.recursive)
        .keep_strategy(KeepStrategy::from(cli.keep))
        .visit_priority(VisitPriority::from(cli.priority))
        .dry_run(!cli.apply)
        .build()?;

    let dry_run = config.dry_run;
    let stats = process_roots(&store, &[store.root_folder()], &config, &SystemClock)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print_summary(&stats, dry_run),
    }
    Ok(())
}

fn print_summary(stats: &RootStats, dry_run: bool) {
    println!("Folders visited:        {}", stats.folders_visited);
    println!("Folder groups merged:   {}", stats.merge.groups_merged);
    println!("Files moved:            {}", stats.merge.files_moved);
    println!("Files renamed:          {}", stats.merge.files_renamed);
    println!(
        "Duplicates trashed:     {}",
        stats.merge.duplicates_handled + stats.dedup.files_trashed
    );
    println!("Source folders removed: {}", stats.merge.folders_removed);
    println!(
        "Space {}:      {}",
        if dry_run { "reclaimable" } else { "reclaimed" },
        format_size(stats.bytes_freed(), DECIMAL)
    );

    let warnings = stats.merge.warnings.len() + stats.dedup.warnings.len();
    if warnings > 0 {
        println!("Warnings:               {warnings} (see log output)");
    }
    if stats.budget_exhausted {
        println!("Stopped early: the execution budget ran out; re-run to continue.");
    }
    if dry_run {
        println!();
        println!("Dry run only. Re-run with --apply to make these changes.");
    }
}
