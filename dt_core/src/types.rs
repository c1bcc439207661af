use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamp format used in partition rows ("logged at" column).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical calendar-date format used in the ledger and partition rows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Short code naming one tracked source group (e.g. a product group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GroupCode(String);

impl GroupCode {
    pub fn new(code: String) -> Option<Self> {
        if code.is_empty() || code.len() > 32 {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for GroupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GroupCode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string()).ok_or_else(|| anyhow::anyhow!("Invalid group code"))
    }
}

/// Opaque identifier of one remote tabular source (a sheet, table, export).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SourceId(u64);

impl SourceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplication identity of a trackable record across runs.
///
/// The identity is the `(group, record_id)` pair only. The monitored field
/// is deliberately NOT part of the key: two fields on the same record that
/// share an occurrence date count as one logged date for that record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Identity {
    pub group: GroupCode,
    pub record_id: u64
}

impl Identity {
    pub fn new(group: GroupCode, record_id: u64) -> Self {
        Self { group, record_id }
    }

    /// Colon-joined ledger key, e.g. `NA:6141179298008964`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.record_id)
    }
}

impl std::str::FromStr for Identity {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, record_id) = s
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("Identity key missing ':' separator"))?;
        let group = GroupCode::new(group.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid group code in identity key"))?;
        let record_id = record_id
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("Invalid record id in identity key"))?;
        Ok(Self { group, record_id })
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One monitored field definition: the date column to watch, the column
/// naming the actor who filled it, and the field's ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub date_column: String,
    pub actor_column: String,
    pub ordinal: u8
}

impl FieldSpec {
    pub fn new(
        date_column: impl Into<String>,
        actor_column: impl Into<String>,
        ordinal: u8
    ) -> Self {
        Self {
            date_column: date_column.into(),
            actor_column: actor_column.into(),
            ordinal
        }
    }
}

/// One raw record as returned by a source client: a stable identifier plus
/// a mapping from column title to display value. Records are never mutated
/// by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: Option<u64>,
    pub cells: HashMap<String, String>
}

impl SourceRecord {
    pub fn new(id: Option<u64>) -> Self {
        Self {
            id,
            cells: HashMap::new()
        }
    }

    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// Trimmed, non-empty cell value for a column title.
    pub fn cell(&self, column: &str) -> Option<&str> {
        let value = self.cells.get(column)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

/// One observed value of a monitored field on one record, extracted during
/// a run. Facts are ephemeral; only routed facts reach a partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub group: GroupCode,
    pub record_id: u64,
    pub marketplace: String,
    pub ordinal: u8,
    pub field_name: String,
    /// Business date the field records, normalized. Used for partition
    /// routing and deduplication, not the observation time.
    pub occurrence_date: NaiveDate,
    /// Raw display value the date was parsed from.
    pub value: String,
    pub actor: String
}

impl Fact {
    pub fn identity(&self) -> Identity {
        Identity::new(self.group.clone(), self.record_id)
    }
}

/// One row as persisted in a partition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub logged_at: String,
    pub group: GroupCode,
    pub record_id: u64,
    pub marketplace: String,
    pub ordinal: u8,
    pub field_name: String,
    pub occurrence_date: NaiveDate,
    pub actor: String
}

impl ChangeRecord {
    pub fn from_fact(fact: &Fact, logged_at: impl Into<String>) -> Self {
        Self {
            logged_at: logged_at.into(),
            group: fact.group.clone(),
            record_id: fact.record_id,
            marketplace: fact.marketplace.clone(),
            ordinal: fact.ordinal,
            field_name: fact.field_name.clone(),
            occurrence_date: fact.occurrence_date,
            actor: fact.actor.clone()
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.group.clone(), self.record_id)
    }
}

/// Engine run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Deduplicate against the persisted ledger and update it.
    Incremental,
    /// Bulk load from a historical seed source; the ledger is neither
    /// consulted nor mutated.
    Bootstrap
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incremental => write!(f, "incremental"),
            Self::Bootstrap => write!(f, "bootstrap")
        }
    }
}
