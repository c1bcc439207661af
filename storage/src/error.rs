use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the file-backed tracker store.
///
/// Each failure kind is a discrete variant so callers can branch on what
/// went wrong instead of matching message text.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger file corrupt: {}: {reason}", path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    #[error("Unrecognized partition file name: {file}")]
    BadPartitionLabel { file: String },

    #[error("Partition file corrupt: {}: {reason}", path.display())]
    PartitionCorrupt { path: PathBuf, reason: String }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_file() {
        let err = StorageError::LedgerCorrupt {
            path: PathBuf::from("/data/date_backup.csv"),
            reason: "bad date".to_string()
        };
        let text = err.to_string();
        assert!(text.contains("date_backup.csv"));
        assert!(text.contains("bad date"));
    }
}
