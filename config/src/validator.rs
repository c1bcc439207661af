//! # Configuration Validation
//!
//! Structural validation for the tracker configuration. The rules here are
//! cross-field (duplicate codes, duplicate ordinals), so they are expressed
//! as explicit checks with a dedicated error enum rather than per-field
//! range attributes.

use crate::config::TrackerConfig;
use std::collections::HashSet;

/// Configuration validation error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("No tracked groups configured")]
    NoGroups,

    #[error("No monitored fields configured")]
    NoFields,

    #[error("Duplicate group code: {code}")]
    DuplicateGroup { code: String },

    #[error("Duplicate field ordinal: {ordinal}")]
    DuplicateOrdinal { ordinal: u8 },

    #[error("Duplicate field date column: {column}")]
    DuplicateFieldColumn { column: String },

    #[error("Monitored field has an empty date column title")]
    EmptyFieldColumn,

    #[error("Ledger file name is empty")]
    EmptyLedgerFile,

    #[error("Retention must keep at least one partition")]
    ZeroRetention,
}

/// Validate configuration structure.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Ensures the configuration is internally consistent before any component
/// is constructed from it.
///
/// ## Validation Rules
/// - At least one tracked group; group codes unique
/// - At least one monitored field; date columns non-empty and unique;
///   ordinals unique
/// - Non-empty ledger file name
/// - Retention keeps at least one partition
///
/// ## Usage
/// ```rust,no_run
/// use config::{TrackerConfig, validate};
///
/// let config = TrackerConfig::default();
/// match validate(&config) {
///     Ok(()) => println!("Configuration is valid"),
///     Err(error) => println!("Validation error: {error}"),
/// }
/// ```
pub fn validate(config: &TrackerConfig) -> Result<(), ConfigValidationError> {
    if config.groups.is_empty() {
        return Err(ConfigValidationError::NoGroups);
    }
    if config.fields.is_empty() {
        return Err(ConfigValidationError::NoFields);
    }
    if config.ledger_file.trim().is_empty() {
        return Err(ConfigValidationError::EmptyLedgerFile);
    }
    if config.retention.keep_partitions == 0 {
        return Err(ConfigValidationError::ZeroRetention);
    }

    let mut codes = HashSet::new();
    for group in &config.groups {
        if !codes.insert(group.code.as_str()) {
            return Err(ConfigValidationError::DuplicateGroup {
                code: group.code.as_str().to_string(),
            });
        }
    }

    let mut ordinals = HashSet::new();
    let mut columns = HashSet::new();
    for field in &config.fields {
        if field.date_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFieldColumn);
        }
        if !ordinals.insert(field.ordinal) {
            return Err(ConfigValidationError::DuplicateOrdinal {
                ordinal: field.ordinal,
            });
        }
        if !columns.insert(field.date_column.as_str()) {
            return Err(ConfigValidationError::DuplicateFieldColumn {
                column: field.date_column.clone(),
            });
        }
    }

    Ok(())
}
