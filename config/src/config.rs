//! # Configuration Structures
//!
//! This module defines all configuration structures for the DateTrack
//! system.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Carry defaults so partial config files load cleanly
//! - Are passed explicitly into every component at construction; there is
//!   no ambient/global lookup

use dt_core::types::{FieldSpec, GroupCode, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure for the DateTrack system.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Provides the single immutable configuration value shared by every
/// component: tracked groups and their remote sources, the ordered
/// monitored-field list, seed-source settings, retention, and the color
/// mappings consumed by external report rendering.
///
/// ## Usage
/// ```rust,no_run
/// use config::TrackerConfig;
///
/// let config = TrackerConfig::default();
/// println!("Data directory: {}", config.data_dir.display());
/// ```
///
/// ## Fields
/// - `data_dir`: directory holding the ledger and all partition files
/// - `ledger_file`: ledger file name inside `data_dir`
/// - `groups`: tracked groups, each bound to one remote source
/// - `fields`: ordered monitored-field descriptors; extraction iterates
///   this list, so growing it is additive
/// - `marketplace_column`: column carrying the record's sub-dimension
/// - `seed`: historical seed source used by bootstrap runs
/// - `retention`: partition retention applied by the trimmer
/// - `colors`: group/actor color mappings for downstream report rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    #[serde(default)]
    pub groups: Vec<GroupConfig>,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default = "default_marketplace_column")]
    pub marketplace_column: String,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub colors: ColorConfig,
}

/// One tracked group and the remote source it is read from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupConfig {
    pub code: GroupCode,
    pub source: SourceId,

    /// Total records in the group, used by external reports for
    /// percentage calculations. Zero means unknown.
    #[serde(default)]
    pub total_products: u32,
}

/// Historical seed source read by bootstrap runs.
///
/// Seed records carry their group in a column rather than being fetched
/// per group, so the group column title is part of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedConfig {
    #[serde(default)]
    pub source: Option<SourceId>,

    #[serde(default = "default_seed_group_column")]
    pub group_column: String,

    /// Default bootstrap cutoff window in days when the caller does not
    /// override it.
    #[serde(default = "default_seed_days_back")]
    pub default_days_back: u32,
}

/// Partition retention applied by the trimmer after backfills.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetentionConfig {
    #[serde(default = "default_keep_partitions")]
    pub keep_partitions: usize,
}

/// Color mappings for downstream report rendering.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Centralizes the group/actor color assignments that used to be
/// duplicated across report callers. Unknown actors get a deterministic
/// fallback color so charts stay stable between report runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorConfig {
    #[serde(default)]
    pub groups: HashMap<String, String>,

    #[serde(default)]
    pub actors: HashMap<String, String>,

    #[serde(default = "default_fallback_colors")]
    pub fallback: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("tracker_logs")
}

fn default_ledger_file() -> String {
    "date_backup.csv".to_string()
}

fn default_marketplace_column() -> String {
    "Amazon".to_string()
}

fn default_seed_group_column() -> String {
    "Produktgruppe".to_string()
}

fn default_seed_days_back() -> u32 {
    90
}

fn default_keep_partitions() -> usize {
    3
}

fn default_fallback_colors() -> Vec<String> {
    [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
        "#bcbd22", "#17becf",
    ]
    .iter()
    .map(|c| (*c).to_string())
    .collect()
}

const UNKNOWN_COLOR: &str = "#808080";

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ledger_file: default_ledger_file(),
            groups: Vec::new(),
            fields: Vec::new(),
            marketplace_column: default_marketplace_column(),
            seed: SeedConfig::default(),
            retention: RetentionConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            source: None,
            group_column: default_seed_group_column(),
            default_days_back: default_seed_days_back(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep_partitions: default_keep_partitions(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
            actors: HashMap::new(),
            fallback: default_fallback_colors(),
        }
    }
}

impl TrackerConfig {
    /// Full path of the persisted ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    pub fn group(&self, code: &GroupCode) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| &g.code == code)
    }

    pub fn is_known_group(&self, code: &GroupCode) -> bool {
        self.group(code).is_some()
    }

    pub fn field(&self, date_column: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.date_column == date_column)
    }
}

impl ColorConfig {
    pub fn group_color(&self, code: &GroupCode) -> &str {
        self.groups
            .get(code.as_str())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_COLOR)
    }

    /// Color for an actor, falling back to a deterministic pick from the
    /// fallback palette for actors without an explicit assignment.
    pub fn actor_color(&self, actor: &str) -> &str {
        if let Some(color) = self.actors.get(actor) {
            return color;
        }
        if self.fallback.is_empty() {
            return UNKNOWN_COLOR;
        }
        let digest: usize = actor.bytes().map(usize::from).sum();
        &self.fallback[digest % self.fallback.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(code: &str, source: u64) -> GroupConfig {
        GroupConfig {
            code: GroupCode::new(code.to_string()).unwrap(),
            source: SourceId::new(source),
            total_products: 0,
        }
    }

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("tracker_logs"));
        assert_eq!(config.ledger_file, "date_backup.csv");
        assert_eq!(config.marketplace_column, "Amazon");
        assert_eq!(config.retention.keep_partitions, 3);
        assert_eq!(config.seed.default_days_back, 90);
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_ledger_path_joins_data_dir() {
        let config = TrackerConfig::default();
        assert_eq!(
            config.ledger_path(),
            PathBuf::from("tracker_logs").join("date_backup.csv")
        );
    }

    #[test]
    fn test_group_lookup() {
        let mut config = TrackerConfig::default();
        config.groups.push(group("NA", 1));
        config.groups.push(group("NF", 2));

        let na = GroupCode::new("NA".to_string()).unwrap();
        let nx = GroupCode::new("NX".to_string()).unwrap();
        assert_eq!(config.group(&na).unwrap().source, SourceId::new(1));
        assert!(config.is_known_group(&na));
        assert!(!config.is_known_group(&nx));
    }

    #[test]
    fn test_actor_color_is_deterministic() {
        let colors = ColorConfig::default();
        let first = colors.actor_color("ZZ").to_string();
        assert_eq!(colors.actor_color("ZZ"), first);
        assert!(first.starts_with('#'));
    }

    #[test]
    fn test_actor_color_prefers_explicit_assignment() {
        let mut colors = ColorConfig::default();
        colors.actors.insert("EK".to_string(), "#6A5AAA".to_string());
        assert_eq!(colors.actor_color("EK"), "#6A5AAA");
    }

    #[test]
    fn test_group_color_unknown_is_gray() {
        let colors = ColorConfig::default();
        let code = GroupCode::new("NA".to_string()).unwrap();
        assert_eq!(colors.group_color(&code), "#808080");
    }
}
