//! # Environment Variable Loader
//!
//! Loads configuration overrides from environment variables following
//! 12-factor app principles.
//!
//! # Naming Convention
//! - `DT_*`: DateTrack settings

use crate::config::TrackerConfig;
use dt_core::types::SourceId;
use std::env;
use std::path::PathBuf;

/// Load configuration from environment variables on top of defaults.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from environment variables. Environment variables
/// override default values but can be overridden by an explicit config
/// file merged by the caller.
///
/// ## Environment Variables
/// - `DT_DATA_DIR`: directory holding ledger and partitions
/// - `DT_LEDGER_FILE`: ledger file name (default: "date_backup.csv")
/// - `DT_MARKETPLACE_COLUMN`: sub-dimension column title
/// - `DT_SEED_SOURCE`: numeric id of the bootstrap seed source
/// - `DT_SEED_GROUP_COLUMN`: group column title on the seed source
/// - `DT_SEED_DAYS_BACK`: default bootstrap cutoff window in days
/// - `DT_KEEP_PARTITIONS`: partitions retained by the trimmer
pub fn load_from_env() -> TrackerConfig {
    apply_env_overrides(TrackerConfig::default())
}

/// Apply `DT_*` environment overrides to an existing configuration.
pub fn apply_env_overrides(mut config: TrackerConfig) -> TrackerConfig {
    if let Ok(dir) = env::var("DT_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(file) = env::var("DT_LEDGER_FILE") {
        config.ledger_file = file;
    }
    if let Ok(column) = env::var("DT_MARKETPLACE_COLUMN") {
        config.marketplace_column = column;
    }
    if let Ok(source) = parse_env::<u64>("DT_SEED_SOURCE") {
        config.seed.source = Some(SourceId::new(source));
    }
    if let Ok(column) = env::var("DT_SEED_GROUP_COLUMN") {
        config.seed.group_column = column;
    }
    if let Ok(days) = parse_env::<u32>("DT_SEED_DAYS_BACK") {
        config.seed.default_days_back = days;
    }
    if let Ok(keep) = parse_env::<usize>("DT_KEEP_PARTITIONS") {
        config.retention.keep_partitions = keep;
    }
    config
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(s) => s
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>),
    }
}
