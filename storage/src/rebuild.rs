//! Ledger reconstruction: rebuild the deduplication ledger by replaying
//! every partition file. This is the explicit recovery path for a corrupt
//! or lost ledger; it is never invoked automatically.

use crate::error::StorageError;
use crate::ledger::Ledger;
use crate::partition::{list_partition_files, read_partition};
use std::path::Path;
use tracing::info;

/// Replay all partitions in `dir` into a fresh ledger mapping each
/// identity to the occurrence dates already present in any partition.
///
/// Reconstruction is strict: a partition row that cannot be parsed aborts
/// the rebuild, because a guessed ledger would silently re-introduce the
/// duplicate or lost entries this path exists to repair.
pub fn rebuild_ledger(dir: &Path) -> Result<Ledger, StorageError> {
    let mut ledger = Ledger::new();
    let files = list_partition_files(dir)?;
    let partition_count = files.len();

    for path in files {
        for record in read_partition(&path)? {
            ledger.mark(&record.identity(), record.occurrence_date);
        }
    }

    info!(
        partitions = partition_count,
        entries = ledger.len(),
        "Rebuilt ledger from partitions"
    );
    Ok(ledger)
}
