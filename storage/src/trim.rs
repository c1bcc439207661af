//! Retention enforcement: keep the N most recent monthly partitions and
//! delete the rest. Deletion is the one unrecoverable operation in the
//! system, so the keep/remove decision is computed and logged in full
//! before the first file is removed, and any partition whose label cannot
//! be parsed aborts the whole trim.

use crate::error::StorageError;
use crate::partition::{list_partition_files, parse_partition_label};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Retain the `keep_n` chronologically newest partitions in `dir`, delete
/// the remainder, and return the deleted paths.
pub fn trim_partitions(dir: &Path, keep_n: usize) -> Result<Vec<PathBuf>, StorageError> {
    let files = list_partition_files(dir)?;

    let mut dated: Vec<((i32, u32), PathBuf)> = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        match parse_partition_label(&name) {
            Some(key) => dated.push((key, path)),
            None => {
                // Either a naming collision or a corrupt store; guessing
                // here could delete the wrong files.
                warn!(file = %name, "Aborting trim on unrecognized partition file name");
                return Err(StorageError::BadPartitionLabel { file: name });
            }
        }
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    let keep: Vec<String> = dated
        .iter()
        .take(keep_n)
        .map(|(_, p)| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
        .collect();
    let remove: Vec<PathBuf> = dated.into_iter().skip(keep_n).map(|(_, p)| p).collect();

    info!(
        keeping = keep.len(),
        removing = remove.len(),
        kept = ?keep,
        "Partition retention decision"
    );

    let mut removed = Vec::with_capacity(remove.len());
    for path in remove {
        fs::remove_file(&path)?;
        info!(file = %path.display(), "Removed expired partition");
        removed.push(path);
    }

    Ok(removed)
}
