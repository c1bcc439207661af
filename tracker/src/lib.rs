//! # Change Tracking Engine
//!
//! Orchestrates fact extraction, novelty checking against the ledger,
//! partition routing, and ledger persistence for the DateTrack system.

pub mod engine;
pub mod error;
pub mod extract;
pub mod report;

pub use engine::{BootstrapOptions, ChangeTracker, GroupBatch};
pub use error::{TrackerError, TrackerResult};
pub use extract::{Extraction, extract_facts, parse_date_fuzzy};
pub use report::{FieldCounts, RunError, RunErrorKind, RunOutcome, RunReport};
