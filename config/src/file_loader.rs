//! # Configuration File Loading
//!
//! Loads configuration from TOML or YAML files.
//!
//! Supports automatic format detection based on file extension.

use crate::config::TrackerConfig;
use std::path::Path;

/// Configuration file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

/// Load configuration from TOML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads complete tracker configuration from a TOML format file.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_toml(Path::new("tracker.toml"))?;
///     println!("Tracked groups: {}", config.groups.len());
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid TOML syntax
/// - Missing required fields
pub fn load_from_toml(path: &Path) -> Result<TrackerConfig, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    let config: TrackerConfig =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;

    Ok(config)
}

/// Load configuration from YAML file.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads complete tracker configuration from a YAML format file.
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid YAML syntax
/// - Missing required fields
pub fn load_from_yaml(path: &Path) -> Result<TrackerConfig, ConfigFileError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_e| ConfigFileError::FileNotFound(path.display().to_string()))?;

    let config: TrackerConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))?;

    Ok(config)
}

/// Load configuration from file with auto-detection.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from file, automatically detecting format from
/// extension.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml`: YAML format
/// - `.yml`: YAML format
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found
/// - Invalid file extension
/// - Parse errors for detected format
pub fn load_from_file(path: &Path) -> Result<TrackerConfig, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_core::types::{GroupCode, SourceId};
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_toml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");

        let toml_content = r#"
data_dir = "data/tracker"
ledger_file = "ledger.csv"
marketplace_column = "Amazon"

[[groups]]
code = "NA"
source = 6141179298008964
total_products = 1779

[[groups]]
code = "NF"
source = 615755411312516

[[fields]]
date_column = "Kontrolle"
actor_column = "K von"
ordinal = 1

[[fields]]
date_column = "BE am"
actor_column = "BE von"
ordinal = 2

[seed]
source = 6879355327172484
group_column = "Produktgruppe"
default_days_back = 30

[retention]
keep_partitions = 5
"#;
        fs::write(&path, toml_content).unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.data_dir, std::path::PathBuf::from("data/tracker"));
        assert_eq!(config.ledger_file, "ledger.csv");
        assert_eq!(config.groups.len(), 2);
        assert_eq!(
            config.groups[0].code,
            GroupCode::new("NA".to_string()).unwrap()
        );
        assert_eq!(config.groups[0].total_products, 1779);
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[1].ordinal, 2);
        assert_eq!(config.seed.source, Some(SourceId::new(6879355327172484)));
        assert_eq!(config.seed.default_days_back, 30);
        assert_eq!(config.retention.keep_partitions, 5);
    }

    #[test]
    fn test_load_from_toml_defaults_fill_gaps() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "data_dir = \"x\"\n").unwrap();

        let config = load_from_toml(&path).unwrap();
        assert_eq!(config.ledger_file, "date_backup.csv");
        assert_eq!(config.retention.keep_partitions, 3);
        assert!(config.seed.source.is_none());
    }

    #[test]
    fn test_load_from_yaml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("yaml");

        let yaml_content = r#"
data_dir: data/tracker
groups:
  - code: NA
    source: 6141179298008964
fields:
  - date_column: Kontrolle
    actor_column: K von
    ordinal: 1
retention:
  keep_partitions: 4
"#;
        fs::write(&path, yaml_content).unwrap();

        let config = load_from_yaml(&path).unwrap();
        assert_eq!(config.groups.len(), 1);
        assert_eq!(config.fields[0].date_column, "Kontrolle");
        assert_eq!(config.retention.keep_partitions, 4);
    }

    #[test]
    fn test_load_from_file_unsupported() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("json");
        fs::write(&path, "{}").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_from_file_no_extension() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("");
        fs::write(&path, "").unwrap();

        let result = load_from_file(&path);
        assert!(matches!(result, Err(ConfigFileError::NoExtension)));
    }

    #[test]
    fn test_load_from_toml_invalid() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "[invalid\n").unwrap();

        let result = load_from_toml(&path);
        assert!(matches!(result, Err(ConfigFileError::TomlParse(_))));
    }

    #[test]
    fn test_load_from_toml_not_found() {
        let path = Path::new("/nonexistent/path/tracker.toml");
        let result = load_from_toml(path);
        assert!(matches!(result, Err(ConfigFileError::FileNotFound(_))));
    }
}
