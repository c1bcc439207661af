use dt_core::error::SourceError;
use storage::StorageError;
use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Fatal run failures. Per-record conditions (unparsable date, missing
/// record id, unknown group) are tallied in the run report instead and
/// never surface here.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Source fetch failed: {0}")]
    Source(#[from] SourceError),

    #[error("Ledger read failed: {source}")]
    LedgerRead {
        #[source]
        source: StorageError
    },

    #[error("Ledger write failed after partitions were committed: {source}")]
    LedgerWrite {
        #[source]
        source: StorageError
    },

    #[error("Retention trim failed: {source}")]
    Trim {
        #[source]
        source: StorageError
    },

    #[error("Ledger reconstruction failed: {source}")]
    Rebuild {
        #[source]
        source: StorageError
    },

    #[error("Bootstrap requested but no seed source is configured")]
    SeedNotConfigured
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_core::types::SourceId;

    #[test]
    fn test_source_error_converts() {
        let err: TrackerError = SourceError::NotFound {
            source_id: SourceId::new(1)
        }
        .into();
        assert!(matches!(err, TrackerError::Source(_)));
    }

    #[test]
    fn test_ledger_write_message_mentions_committed_partitions() {
        let err = TrackerError::LedgerWrite {
            source: StorageError::Io(std::io::Error::other("disk full"))
        };
        assert!(err.to_string().contains("partitions were committed"));
    }
}
