use crate::error::{TrackerError, TrackerResult};
use crate::extract::extract_facts;
use crate::report::{RunErrorKind, RunReport};
use chrono::{Days, NaiveDate, Utc};
use config::TrackerConfig;
use dt_core::traits::SourceClient;
use dt_core::types::{ChangeRecord, GroupCode, RunMode, SourceRecord, TIMESTAMP_FORMAT};
use std::path::PathBuf;
use std::sync::Arc;
use storage::partition::bucket_label;
use storage::{LedgerStore, PartitionRouter};
use tracing::{debug, info, warn};

/// Pre-fetched records for one group, as handed to the core tracking loop.
///
/// The group is carried as the raw code string so that records tagged with
/// a group outside the configured set are skipped and tallied instead of
/// failing the run.
#[derive(Debug, Clone)]
pub struct GroupBatch {
    pub group: String,
    pub records: Vec<SourceRecord>
}

/// Cutoff window for bootstrap runs, mirroring the historical backfill
/// flags: a days-back window (defaulted from configuration) or no cutoff
/// at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    pub days_back: Option<u32>,
    pub no_cutoff: bool
}

impl BootstrapOptions {
    fn cutoff(&self, default_days_back: u32, today: NaiveDate) -> Option<NaiveDate> {
        if self.no_cutoff {
            return None;
        }
        let days = u64::from(self.days_back.unwrap_or(default_days_back));
        Some(today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN))
    }
}

/// The change tracking engine: decides which observed facts are genuinely
/// new, appends them to the right partition, and keeps the deduplication
/// ledger in step with what was durably written.
pub struct ChangeTracker {
    config: Arc<TrackerConfig>,
    client: Arc<dyn SourceClient>
}

impl ChangeTracker {
    pub fn new(config: Arc<TrackerConfig>, client: Arc<dyn SourceClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Run the engine in the given mode with default options.
    pub async fn run(&self, mode: RunMode) -> TrackerResult<RunReport> {
        match mode {
            RunMode::Incremental => self.run_incremental().await,
            RunMode::Bootstrap => self.run_bootstrap(BootstrapOptions::default()).await
        }
    }

    /// Incremental run: fetch every configured group up front, log the
    /// facts absent from the ledger, persist the updated ledger.
    pub async fn run_incremental(&self) -> TrackerResult<RunReport> {
        info!(groups = self.config.groups.len(), "Starting incremental tracking run");
        let batches = self.fetch_group_batches().await?;
        self.track(&batches, RunMode::Incremental)
    }

    /// Bootstrap run: bulk-load the historical seed source, bypassing the
    /// ledger entirely. The target partitions are expected to start empty.
    pub async fn run_bootstrap(&self, options: BootstrapOptions) -> TrackerResult<RunReport> {
        let Some(seed_source) = self.config.seed.source else {
            return Err(TrackerError::SeedNotConfigured);
        };
        info!(source = %seed_source, "Starting bootstrap run from seed source");

        let records = self.client.fetch_records(seed_source).await?;
        info!(count = records.len(), "Fetched seed records");
        let batches = self.assemble_seed_batches(records);

        let cutoff = options.cutoff(self.config.seed.default_days_back, Utc::now().date_naive());
        if let Some(cutoff) = cutoff {
            debug!(cutoff = %cutoff, "Applying bootstrap cutoff");
        }
        self.track_with_cutoff(&batches, RunMode::Bootstrap, cutoff)
    }

    /// Core tracking loop over pre-fetched batches.
    pub fn track(&self, batches: &[GroupBatch], mode: RunMode) -> TrackerResult<RunReport> {
        self.track_with_cutoff(batches, mode, None)
    }

    /// As [`track`](Self::track), additionally skipping facts whose
    /// occurrence date falls before `cutoff`.
    pub fn track_with_cutoff(
        &self,
        batches: &[GroupBatch],
        mode: RunMode,
        cutoff: Option<NaiveDate>
    ) -> TrackerResult<RunReport> {
        let mut report = RunReport::new(mode, &self.config.fields);

        // Bootstrap never consults or mutates the persisted ledger; the
        // two retention regimes must stay independent.
        let mut ledger = match mode {
            RunMode::Incremental => Some(
                self.ledger_store()
                    .load()
                    .map_err(|source| TrackerError::LedgerRead { source })?
            ),
            RunMode::Bootstrap => None
        };

        let logged_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let mut router = PartitionRouter::new(&self.config.data_dir);

        for batch in batches {
            let Some(group) = GroupCode::new(batch.group.clone()) else {
                report.unknown_groups += batch.records.len() as u32;
                warn!(group = %batch.group, "Skipping records with invalid group code");
                continue;
            };
            if !self.config.is_known_group(&group) {
                report.unknown_groups += batch.records.len() as u32;
                warn!(group = %group, count = batch.records.len(), "Skipping records for unknown group");
                continue;
            }

            for record in &batch.records {
                let Some(record_id) = record.id else {
                    report.missing_record_id += 1;
                    continue;
                };

                let extraction = extract_facts(
                    record,
                    record_id,
                    &group,
                    &self.config.marketplace_column,
                    &self.config.fields
                );

                for date_column in &extraction.unparsable {
                    if let Some(counts) = report.field_mut(date_column) {
                        counts.found += 1;
                    }
                    report.unparsable_dates += 1;
                }

                for fact in &extraction.facts {
                    if let Some(counts) = report.field_mut(&fact.field_name) {
                        counts.found += 1;
                    }

                    if let Some(cutoff) = cutoff
                        && fact.occurrence_date < cutoff
                    {
                        report.cutoff_skipped += 1;
                        continue;
                    }

                    if let Some(ledger) = ledger.as_ref()
                        && ledger.contains(&fact.identity(), fact.occurrence_date)
                    {
                        report.duplicates_skipped += 1;
                        continue;
                    }

                    let change = ChangeRecord::from_fact(fact, logged_at.as_str());
                    let label = bucket_label(fact.occurrence_date);
                    let appended = router
                        .route(fact.occurrence_date)
                        .and_then(|appender| appender.append(&change));
                    match appended {
                        Ok(()) => {
                            report.new_rows += 1;
                            if let Some(counts) = report.field_mut(&fact.field_name) {
                                counts.written += 1;
                            }
                            // Mark only what was durably appended, so the
                            // ledger never runs ahead of the partitions.
                            if let Some(ledger) = ledger.as_mut() {
                                ledger.mark(&fact.identity(), fact.occurrence_date);
                            }
                            debug!(
                                identity = %fact.identity(),
                                field = %fact.field_name,
                                date = %fact.occurrence_date,
                                "Logged new change"
                            );
                        }
                        Err(e) => {
                            warn!(partition = %label, error = %e, "Partition append failed");
                            report.record_error(RunErrorKind::PartitionWrite, &label, e);
                        }
                    }
                }
            }
        }

        if let Err(e) = router.close_all() {
            report.record_error(RunErrorKind::PartitionFlush, "partitions", e);
        }

        if let Some(ledger) = ledger {
            self.ledger_store().save(&ledger).map_err(|source| {
                warn!(
                    new_rows = report.new_rows,
                    "Partitions were committed but the ledger save failed; reconstruction may be required"
                );
                TrackerError::LedgerWrite { source }
            })?;
        }

        report.complete();
        info!(
            mode = %mode,
            new_rows = report.new_rows,
            duplicates_skipped = report.duplicates_skipped,
            unparsable_dates = report.unparsable_dates,
            missing_record_id = report.missing_record_id,
            unknown_groups = report.unknown_groups,
            errors = report.errors.len(),
            "Tracking run completed"
        );
        Ok(report)
    }

    /// Enforce partition retention from configuration. Returns the removed
    /// partition files.
    pub fn trim_partitions(&self) -> TrackerResult<Vec<PathBuf>> {
        storage::trim_partitions(
            &self.config.data_dir,
            self.config.retention.keep_partitions
        )
        .map_err(|source| TrackerError::Trim { source })
    }

    /// Explicit recovery operation: rebuild the ledger by replaying every
    /// partition, then persist it. Returns the number of ledger entries.
    pub fn recover_ledger(&self) -> TrackerResult<usize> {
        let ledger = storage::rebuild_ledger(&self.config.data_dir)
            .map_err(|source| TrackerError::Rebuild { source })?;
        self.ledger_store()
            .save(&ledger)
            .map_err(|source| TrackerError::LedgerWrite { source })?;
        Ok(ledger.len())
    }

    fn ledger_store(&self) -> LedgerStore {
        LedgerStore::new(self.config.ledger_path())
    }

    async fn fetch_group_batches(&self) -> TrackerResult<Vec<GroupBatch>> {
        let mut batches = Vec::with_capacity(self.config.groups.len());
        for group in &self.config.groups {
            let records = self.client.fetch_records(group.source).await?;
            debug!(group = %group.code, count = records.len(), "Fetched group records");
            batches.push(GroupBatch {
                group: group.code.as_str().to_string(),
                records
            });
        }
        Ok(batches)
    }

    /// Group seed records by the configured group column, preserving
    /// first-seen group order and row order within each group. Records
    /// without a group value end up in an empty-code batch that the core
    /// loop tallies as unknown.
    fn assemble_seed_batches(&self, records: Vec<SourceRecord>) -> Vec<GroupBatch> {
        let column = &self.config.seed.group_column;
        let mut batches: Vec<GroupBatch> = Vec::new();
        for record in records {
            let code = record.cell(column).unwrap_or("").to_string();
            match batches.iter_mut().find(|b| b.group == code) {
                Some(batch) => batch.records.push(record),
                None => batches.push(GroupBatch {
                    group: code,
                    records: vec![record]
                })
            }
        }
        batches
    }
}
