//! Deduplication ledger: one entry per identity, holding the set of
//! occurrence dates already logged for it. Entries only grow during
//! incremental runs; the persisted file is the sole source of truth for
//! "has this already been logged".

use crate::error::StorageError;
use chrono::NaiveDate;
use dt_core::types::{DATE_FORMAT, Identity};
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

const LEDGER_HEADER: [&str; 2] = ["RowKey", "LoggedDates..."];

/// In-memory ledger state for one run. Lookups are O(1) expected; the
/// persisted form is sorted at save time instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: HashMap<String, HashSet<NaiveDate>>
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &Identity, date: NaiveDate) -> bool {
        self.entries
            .get(&identity.key())
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Idempotent insert. Returns true when the date was not yet present.
    pub fn mark(&mut self, identity: &Identity, date: NaiveDate) -> bool {
        self.entries.entry(identity.key()).or_default().insert(date)
    }

    pub fn dates(&self, identity: &Identity) -> Option<&HashSet<NaiveDate>> {
        self.entries.get(&identity.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<NaiveDate>)> {
        self.entries.iter()
    }

    pub(crate) fn merge_entry(&mut self, key: String, dates: impl IntoIterator<Item = NaiveDate>) {
        self.entries.entry(key).or_default().extend(dates);
    }
}

/// File-backed ledger persistence with crash-safe replace semantics.
///
/// `save` writes the full ledger to a temporary sibling file, syncs it,
/// then renames it over the live file, so a crash mid-write leaves the
/// previous valid ledger readable.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted ledger. A missing file is an empty ledger (first
    /// run), not an error; anything unreadable or unparsable is fatal.
    pub fn load(&self) -> Result<Ledger, StorageError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No persisted ledger, starting empty");
            return Ok(Ledger::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => record?,
            None => {
                return Err(self.corrupt("file is empty, expected a header row"));
            }
        };
        if header.get(0) != Some(LEDGER_HEADER[0]) {
            return Err(self.corrupt("missing RowKey header"));
        }

        let mut ledger = Ledger::new();
        for record in records {
            let record = record?;
            let key = match record.get(0) {
                Some(key) if !key.trim().is_empty() => key.trim().to_string(),
                _ => return Err(self.corrupt("row with empty identity key"))
            };
            let mut dates = HashSet::new();
            for field in record.iter().skip(1) {
                let field = field.trim();
                if field.is_empty() {
                    continue;
                }
                let date = NaiveDate::parse_from_str(field, DATE_FORMAT).map_err(|_| {
                    self.corrupt(&format!("unparsable date '{field}' for key '{key}'"))
                })?;
                dates.insert(date);
            }
            ledger.merge_entry(key, dates);
        }

        debug!(entries = ledger.len(), "Loaded ledger");
        Ok(ledger)
    }

    /// Durably persist the full ledger via write-new-then-atomically-replace.
    pub fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        writer.write_record(LEDGER_HEADER)?;
        let mut keys: Vec<&String> = ledger.entries.keys().collect();
        keys.sort_unstable();
        for key in keys {
            let mut dates: Vec<NaiveDate> = ledger.entries[key].iter().copied().collect();
            dates.sort_unstable();
            let mut row = Vec::with_capacity(dates.len() + 1);
            row.push(key.clone());
            for date in dates {
                row.push(date.format(DATE_FORMAT).to_string());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;

        let file = writer
            .into_inner()
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(entries = ledger.len(), path = %self.path.display(), "Persisted ledger");
        Ok(())
    }

    fn corrupt(&self, reason: &str) -> StorageError {
        StorageError::LedgerCorrupt {
            path: self.path.clone(),
            reason: reason.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_core::types::GroupCode;

    fn identity(group: &str, record_id: u64) -> Identity {
        Identity::new(GroupCode::new(group.to_string()).unwrap(), record_id)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_mark_is_idempotent() {
        let mut ledger = Ledger::new();
        let id = identity("NA", 100);
        assert!(ledger.mark(&id, date(2025, 8, 1)));
        assert!(!ledger.mark(&id, date(2025, 8, 1)));
        assert!(ledger.contains(&id, date(2025, 8, 1)));
        assert!(!ledger.contains(&id, date(2025, 8, 2)));
        assert_eq!(ledger.dates(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("date_backup.csv"));
        let ledger = store.load().unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("date_backup.csv"));

        let mut ledger = Ledger::new();
        ledger.mark(&identity("NA", 100), date(2025, 8, 1));
        ledger.mark(&identity("NA", 100), date(2025, 8, 2));
        ledger.mark(&identity("NF", 7), date(2025, 7, 15));
        store.save(&ledger).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.dates(&identity("NA", 100)).unwrap().len(), 2);
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_backup.csv");
        let store = LedgerStore::new(&path);
        store.save(&Ledger::new()).unwrap();

        assert!(path.exists());
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["date_backup.csv".to_string()]);
    }

    #[test]
    fn test_save_replaces_previous_ledger_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("date_backup.csv"));

        let mut first = Ledger::new();
        first.mark(&identity("NA", 1), date(2025, 1, 1));
        store.save(&first).unwrap();

        let mut second = first.clone();
        second.mark(&identity("NA", 1), date(2025, 2, 2));
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn test_load_rejects_unparsable_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_backup.csv");
        fs::write(&path, "RowKey,LoggedDates...\nNA:1,not-a-date\n").unwrap();

        let store = LedgerStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(StorageError::LedgerCorrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_missing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_backup.csv");
        fs::write(&path, "NA:1,2025-08-01\n").unwrap();

        let store = LedgerStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(StorageError::LedgerCorrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_backup.csv");
        fs::write(&path, "").unwrap();

        let store = LedgerStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(StorageError::LedgerCorrupt { .. })
        ));
    }

    #[test]
    fn test_save_failure_keeps_previous_ledger_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_backup.csv");
        let store = LedgerStore::new(&path);

        let mut ledger = Ledger::new();
        ledger.mark(&identity("NA", 1), date(2025, 8, 1));
        store.save(&ledger).unwrap();

        // A store pointed below a regular file cannot create its temp
        // file; the failed save must not disturb the existing ledger.
        let blocked = LedgerStore::new(path.join("nested.csv"));
        assert!(blocked.save(&ledger).is_err());
        assert_eq!(store.load().unwrap(), ledger);
    }

    #[test]
    fn test_keys_with_accented_text_survive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("date_backup.csv"));

        let mut ledger = Ledger::new();
        ledger.merge_entry("GRÜN:42".to_string(), [date(2025, 3, 3)]);
        store.save(&ledger).unwrap();
        assert_eq!(store.load().unwrap(), ledger);
    }
}
