use chrono::{DateTime, Utc};
use dt_core::types::{FieldSpec, RunMode};
use serde::{Deserialize, Serialize};

/// Structured outcome of a run. Fatal failures are `TrackerError`s; a
/// report always describes a run that completed end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    /// The run finished, but some writes failed and are listed in
    /// `errors`; everything written before and after them is committed.
    Partial
}

/// Discrete kind of a non-fatal error recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    PartitionWrite,
    PartitionFlush
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub kind: RunErrorKind,
    pub entity: String,
    pub error: String,
    pub timestamp: DateTime<Utc>
}

/// Per monitored-field tallies, in configured field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCounts {
    pub ordinal: u8,
    pub date_column: String,
    pub found: u32,
    pub written: u32
}

/// Aggregate statistics of one engine run, surfaced to the invoking layer
/// for logging. Not persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: RunOutcome,
    pub fields: Vec<FieldCounts>,
    pub new_rows: u32,
    pub duplicates_skipped: u32,
    pub unparsable_dates: u32,
    pub missing_record_id: u32,
    pub unknown_groups: u32,
    pub cutoff_skipped: u32,
    pub errors: Vec<RunError>
}

impl RunReport {
    pub fn new(mode: RunMode, fields: &[FieldSpec]) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            completed_at: None,
            outcome: RunOutcome::Success,
            fields: fields
                .iter()
                .map(|f| FieldCounts {
                    ordinal: f.ordinal,
                    date_column: f.date_column.clone(),
                    found: 0,
                    written: 0
                })
                .collect(),
            new_rows: 0,
            duplicates_skipped: 0,
            unparsable_dates: 0,
            missing_record_id: 0,
            unknown_groups: 0,
            cutoff_skipped: 0,
            errors: Vec::new()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn record_error(&mut self, kind: RunErrorKind, entity: &str, error: impl ToString) {
        self.errors.push(RunError {
            kind,
            entity: entity.to_string(),
            error: error.to_string(),
            timestamp: Utc::now()
        });
        self.outcome = RunOutcome::Partial;
    }

    pub fn field_mut(&mut self, date_column: &str) -> Option<&mut FieldCounts> {
        self.fields.iter_mut().find(|f| f.date_column == date_column)
    }

    pub fn field(&self, date_column: &str) -> Option<&FieldCounts> {
        self.fields.iter().find(|f| f.date_column == date_column)
    }
}
