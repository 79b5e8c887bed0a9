//! Run configuration.
//!
//! The configuration is a flat, immutable value supplied by the caller and
//! threaded through every operation. Loading and persistence live outside
//! this workspace.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::id::FolderId;
use crate::record::FileRecord;

/// Rule for choosing which of several same-named sibling folders survives a
/// merge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum KeepStrategy {
    /// Keep the folder with the earliest creation timestamp.
    #[default]
    Oldest,
    /// Keep the folder with the latest modification timestamp.
    Newest,
    /// Keep the folder containing the most files, counted recursively.
    MostFiles,
}

/// Order in which folders are visited within the execution budget.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum VisitPriority {
    /// Most recently modified folders first.
    #[default]
    RecencyFirst,
    /// Shuffled order, spreading coverage across repeated partial runs.
    Random,
}

/// Configuration for one consolidation run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SweepConfig {
    /// Maximum time distance, in hours, from a group's earliest member
    /// within which a same-content file counts as an accidental duplicate.
    #[builder(default = "24")]
    #[serde(default = "default_window_hours")]
    pub duplication_window_hours: i64,

    /// Wall-clock budget for one invocation, in seconds.
    #[builder(default = "300")]
    #[serde(default = "default_max_runtime_secs")]
    pub max_runtime_secs: u64,

    /// Folders whose subtrees are never visited.
    #[builder(default)]
    #[serde(default)]
    pub excluded_folders: HashSet<FolderId>,

    /// File extensions excluded from dedup analysis (lowercase, no dot).
    #[builder(default)]
    #[serde(default)]
    pub excluded_extensions: HashSet<String>,

    /// Folder visit order within the budget.
    #[builder(default)]
    #[serde(default)]
    pub visit_priority: VisitPriority,

    /// Only analyze files created within this many days; 0 disables the
    /// filter.
    #[builder(default = "0")]
    #[serde(default)]
    pub max_file_age_days: u32,

    /// Whether the folder-merge phase runs at all.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub merge_enabled: bool,

    /// Whether the merge phase scans the whole subtree or a single level
    /// below each discovered folder.
    #[builder(default = "false")]
    #[serde(default)]
    pub merge_recursive: bool,

    /// Which folder of a duplicate group survives a merge.
    #[builder(default)]
    #[serde(default)]
    pub keep_strategy: KeepStrategy,

    /// Decide and log everything, but issue no mutating store call.
    #[builder(default = "false")]
    #[serde(default)]
    pub dry_run: bool,
}

fn default_window_hours() -> i64 {
    24
}

fn default_max_runtime_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl SweepConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(hours) = self.duplication_window_hours {
            if hours < 0 {
                return Err("duplication window must not be negative".to_string());
            }
        }
        if let Some(secs) = self.max_runtime_secs {
            if secs == 0 {
                return Err("max runtime must be greater than zero".to_string());
            }
        }
        if let Some(ref extensions) = self.excluded_extensions {
            for ext in extensions {
                if ext.starts_with('.') || ext.chars().any(|c| c.is_ascii_uppercase()) {
                    return Err(format!(
                        "excluded extension {ext:?} must be lowercase without a leading dot"
                    ));
                }
            }
        }
        Ok(())
    }
}

impl SweepConfig {
    /// Create a new config builder.
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    /// The duplication window as a chrono duration.
    pub fn duplication_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.duplication_window_hours)
    }

    /// The execution budget as a std duration.
    pub fn max_runtime(&self) -> Duration {
        Duration::from_secs(self.max_runtime_secs)
    }

    /// Check whether a folder identity is excluded.
    pub fn is_folder_excluded(&self, id: &FolderId) -> bool {
        self.excluded_folders.contains(id)
    }

    /// Check whether a file is excluded from analysis by its extension.
    pub fn is_extension_excluded(&self, record: &FileRecord) -> bool {
        match record.extension() {
            Some(ext) => self.excluded_extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }

    /// Oldest admissible creation time, or None when the age filter is off.
    pub fn age_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.max_file_age_days == 0 {
            None
        } else {
            Some(now - chrono::Duration::days(i64::from(self.max_file_age_days)))
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            duplication_window_hours: 24,
            max_runtime_secs: 300,
            excluded_folders: HashSet::new(),
            excluded_extensions: HashSet::new(),
            visit_priority: VisitPriority::default(),
            max_file_age_days: 0,
            merge_enabled: true,
            merge_recursive: false,
            keep_strategy: KeepStrategy::default(),
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FileId;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = SweepConfig::builder()
            .duplication_window_hours(12i64)
            .keep_strategy(KeepStrategy::MostFiles)
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.duplication_window(), chrono::Duration::hours(12));
        assert_eq!(config.keep_strategy, KeepStrategy::MostFiles);
        assert!(config.dry_run);
        assert!(config.merge_enabled);
    }

    #[test]
    fn test_builder_rejects_negative_window() {
        let result = SweepConfig::builder()
            .duplication_window_hours(-1i64)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_dotted_extension() {
        let result = SweepConfig::builder()
            .excluded_extensions(HashSet::from([".pdf".to_string()]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_extension_exclusion_is_case_insensitive() {
        let config = SweepConfig::builder()
            .excluded_extensions(HashSet::from(["pdf".to_string()]))
            .build()
            .unwrap();

        let record = FileRecord::new(FileId::new("f"), "Invoice.PDF", 1, ts(0));
        assert!(config.is_extension_excluded(&record));

        let record = FileRecord::new(FileId::new("f"), "notes.txt", 1, ts(0));
        assert!(!config.is_extension_excluded(&record));
    }

    #[test]
    fn test_age_cutoff() {
        let config = SweepConfig::default();
        assert!(config.age_cutoff(ts(0)).is_none());

        let config = SweepConfig::builder()
            .max_file_age_days(2u32)
            .build()
            .unwrap();
        let cutoff = config.age_cutoff(ts(3 * 86_400)).unwrap();
        assert_eq!(cutoff, ts(86_400));
    }

    #[test]
    fn test_enum_parsing() {
        use std::str::FromStr;
        assert_eq!(
            KeepStrategy::from_str("most-files").unwrap(),
            KeepStrategy::MostFiles
        );
        assert_eq!(
            VisitPriority::from_str("recency-first").unwrap(),
            VisitPriority::RecencyFirst
        );
        assert_eq!(KeepStrategy::Oldest.to_string(), "oldest");
    }
}
