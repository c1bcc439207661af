//! # Storage Layer
//!
//! File-backed storage for the DateTrack system: the deduplication ledger,
//! the monthly partition files, retention trimming, and the explicit
//! ledger-reconstruction recovery path.

pub mod error;
pub mod ledger;
pub mod partition;
pub mod rebuild;
pub mod trim;

pub use error::StorageError;
pub use ledger::{Ledger, LedgerStore};
pub use partition::{
    PARTITION_HEADER, PartitionAppender, PartitionRouter, bucket_label, list_partition_files,
    parse_partition_label, partition_file_name, read_partition
};
pub use rebuild::rebuild_ledger;
pub use trim::trim_partitions;
