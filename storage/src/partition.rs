//! Append-only monthly partition files and the per-run router that caches
//! open write handles. A fact's occurrence date determines its bucket once
//! and forever; rows are appended in observation order and flushed
//! immediately so an interrupted run never leaves a partial record buffered.

use crate::error::StorageError;
use chrono::{Datelike, NaiveDate};
use dt_core::types::{ChangeRecord, DATE_FORMAT, GroupCode};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PARTITION_FILE_PREFIX: &str = "date_changes_log_";
pub const PARTITION_FILE_SUFFIX: &str = ".csv";

/// Fixed partition header. Source column titles contain non-ASCII text;
/// files are UTF-8 throughout.
pub const PARTITION_HEADER: [&str; 8] = [
    "Änderung am",
    "Produktgruppe",
    "RowID",
    "Land/Marketplace",
    "Phase",
    "Feld",
    "Datum",
    "Mitarbeiter"
];

/// Canonical bucket label for an occurrence date, truncated to the month:
/// `MM.YYYY`.
pub fn bucket_label(date: NaiveDate) -> String {
    format!("{:02}.{}", date.month(), date.year())
}

pub fn partition_file_name(label: &str) -> String {
    format!("{PARTITION_FILE_PREFIX}{label}{PARTITION_FILE_SUFFIX}")
}

/// Parse `date_changes_log_MM.YYYY.csv` into a sortable `(year, month)`
/// key. Returns `None` for anything that does not match exactly.
pub fn parse_partition_label(file_name: &str) -> Option<(i32, u32)> {
    let label = file_name
        .strip_prefix(PARTITION_FILE_PREFIX)?
        .strip_suffix(PARTITION_FILE_SUFFIX)?;
    let (month, year) = label.split_once('.')?;
    if month.len() != 2 || year.len() != 4 {
        return None;
    }
    if !month.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// All partition files in a data directory, sorted by file name.
pub fn list_partition_files(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(PARTITION_FILE_PREFIX) && name.ends_with(PARTITION_FILE_SUFFIX) {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

/// Open append handle for one partition file.
pub struct PartitionAppender {
    label: String,
    path: PathBuf,
    writer: csv::Writer<File>
}

impl PartitionAppender {
    fn open(dir: &Path, label: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(partition_file_name(label));
        let fresh = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer.write_record(PARTITION_HEADER)?;
            writer.flush()?;
        }
        debug!(label = %label, path = %path.display(), fresh, "Opened partition");
        Ok(Self {
            label: label.to_string(),
            path,
            writer
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it through to the file immediately.
    pub fn append(&mut self, record: &ChangeRecord) -> Result<(), StorageError> {
        let record_id = record.record_id.to_string();
        let ordinal = record.ordinal.to_string();
        let occurrence_date = record.occurrence_date.format(DATE_FORMAT).to_string();
        self.writer.write_record([
            record.logged_at.as_str(),
            record.group.as_str(),
            record_id.as_str(),
            record.marketplace.as_str(),
            ordinal.as_str(),
            record.field_name.as_str(),
            occurrence_date.as_str(),
            record.actor.as_str()
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Routes occurrence dates to partition append handles, opening each
/// partition at most once per run.
pub struct PartitionRouter {
    dir: PathBuf,
    handles: HashMap<String, PartitionAppender>
}

impl PartitionRouter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handles: HashMap::new()
        }
    }

    /// Handle for the bucket an occurrence date belongs to. Repeated calls
    /// for the same bucket return the same open handle.
    pub fn route(&mut self, date: NaiveDate) -> Result<&mut PartitionAppender, StorageError> {
        let label = bucket_label(date);
        match self.handles.entry(label) {
            std::collections::hash_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let appender = PartitionAppender::open(&self.dir, entry.key())?;
                Ok(entry.insert(appender))
            }
        }
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    /// Flush and release every open handle, attempting all of them even if
    /// one fails; the first failure is returned after the sweep.
    pub fn close_all(&mut self) -> Result<(), StorageError> {
        let mut first_error = None;
        for (label, mut appender) in self.handles.drain() {
            if let Err(e) = appender.flush() {
                warn!(label = %label, error = %e, "Failed to flush partition on close");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(())
        }
    }
}

impl Drop for PartitionRouter {
    fn drop(&mut self) {
        let _ = self.close_all();
    }
}

/// Read one partition file back into records, strictly: reconstruction
/// depends on every row being well formed.
pub fn read_partition(path: &Path) -> Result<Vec<ChangeRecord>, StorageError> {
    let corrupt = |reason: String| StorageError::PartitionCorrupt {
        path: path.to_path_buf(),
        reason
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != PARTITION_HEADER.len() {
            return Err(corrupt(format!("row with {} columns", record.len())));
        }
        let group = GroupCode::new(record[1].trim().to_string())
            .ok_or_else(|| corrupt("row with empty group".to_string()))?;
        let record_id = record[2]
            .trim()
            .parse::<u64>()
            .map_err(|_| corrupt(format!("bad record id '{}'", &record[2])))?;
        let ordinal = record[4]
            .trim()
            .parse::<u8>()
            .map_err(|_| corrupt(format!("bad field ordinal '{}'", &record[4])))?;
        let occurrence_date = NaiveDate::parse_from_str(record[6].trim(), DATE_FORMAT)
            .map_err(|_| corrupt(format!("bad occurrence date '{}'", &record[6])))?;
        out.push(ChangeRecord {
            logged_at: record[0].to_string(),
            group,
            record_id,
            marketplace: record[3].to_string(),
            ordinal,
            field_name: record[5].to_string(),
            occurrence_date,
            actor: record[7].to_string()
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(group: &str, record_id: u64, d: NaiveDate, field: &str, ordinal: u8) -> ChangeRecord {
        ChangeRecord {
            logged_at: "2025-08-06 01:00:00".to_string(),
            group: GroupCode::new(group.to_string()).unwrap(),
            record_id,
            marketplace: "DE".to_string(),
            ordinal,
            field_name: field.to_string(),
            occurrence_date: d,
            actor: "EK".to_string()
        }
    }

    #[test]
    fn test_bucket_label_truncates_to_month() {
        assert_eq!(bucket_label(date(2025, 8, 1)), "08.2025");
        assert_eq!(bucket_label(date(2025, 8, 31)), "08.2025");
        assert_eq!(bucket_label(date(2024, 12, 5)), "12.2024");
    }

    #[test]
    fn test_partition_file_name() {
        assert_eq!(
            partition_file_name("08.2025"),
            "date_changes_log_08.2025.csv"
        );
    }

    #[test]
    fn test_parse_partition_label() {
        assert_eq!(
            parse_partition_label("date_changes_log_08.2025.csv"),
            Some((2025, 8))
        );
        assert_eq!(parse_partition_label("date_changes_log_13.2025.csv"), None);
        assert_eq!(parse_partition_label("date_changes_log_8.2025.csv"), None);
        assert_eq!(parse_partition_label("date_changes_log_garbage.csv"), None);
        assert_eq!(parse_partition_label("weekly_changes.csv"), None);
    }

    #[test]
    fn test_router_caches_handles_per_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = PartitionRouter::new(dir.path());

        router
            .route(date(2025, 8, 1))
            .unwrap()
            .append(&record("NA", 1, date(2025, 8, 1), "Kontrolle", 1))
            .unwrap();
        router
            .route(date(2025, 8, 20))
            .unwrap()
            .append(&record("NA", 2, date(2025, 8, 20), "Kontrolle", 1))
            .unwrap();
        router
            .route(date(2025, 7, 3))
            .unwrap()
            .append(&record("NF", 3, date(2025, 7, 3), "BE am", 2))
            .unwrap();

        assert_eq!(router.open_count(), 2);
        router.close_all().unwrap();

        let files = list_partition_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_header_written_once_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        for run in 0..2 {
            let mut router = PartitionRouter::new(dir.path());
            router
                .route(date(2025, 8, 1))
                .unwrap()
                .append(&record("NA", run, date(2025, 8, 1), "Kontrolle", 1))
                .unwrap();
            router.close_all().unwrap();
        }

        let path = dir.path().join("date_changes_log_08.2025.csv");
        let contents = fs::read_to_string(&path).unwrap();
        let header_rows = contents
            .lines()
            .filter(|l| l.starts_with("Änderung am"))
            .count();
        assert_eq!(header_rows, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = PartitionRouter::new(dir.path());
        let rec = ChangeRecord {
            marketplace: "DE, FR".to_string(),
            actor: "JHÜ".to_string(),
            ..record("NA", 100, date(2025, 8, 1), "Reopen C2 am", 5)
        };
        router.route(date(2025, 8, 1)).unwrap().append(&rec).unwrap();
        router.close_all().unwrap();

        let rows = read_partition(&dir.path().join("date_changes_log_08.2025.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], rec);
    }

    #[test]
    fn test_read_partition_rejects_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_changes_log_08.2025.csv");
        let mut contents = String::new();
        contents.push_str(&PARTITION_HEADER.join(","));
        contents.push('\n');
        contents.push_str("2025-08-06 01:00:00,NA,not-an-id,DE,1,Kontrolle,2025-08-01,EK\n");
        fs::write(&path, contents).unwrap();

        assert!(matches!(
            read_partition(&path),
            Err(StorageError::PartitionCorrupt { .. })
        ));
    }

    #[test]
    fn test_same_date_always_routes_to_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let d = date(2025, 8, 15);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..3 {
            let mut router = PartitionRouter::new(dir.path());
            let appender = router.route(d).unwrap();
            seen.insert(appender.path().to_path_buf());
        }
        assert_eq!(seen.len(), 1);
    }
}
