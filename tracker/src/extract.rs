//! Fact extraction: turn one raw source record into candidate facts, one
//! per monitored field that currently holds a parseable date value.

use chrono::{NaiveDate, NaiveDateTime};
use dt_core::types::{Fact, FieldSpec, GroupCode, SourceRecord};

/// Date-only formats accepted from source cells, tried in order after the
/// ISO datetime form.
const DATE_ONLY_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Extraction result for one record: candidate facts in monitored-field
/// order, plus the date columns whose value did not parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub facts: Vec<Fact>,
    pub unparsable: Vec<String>
}

/// Normalize the date representations seen in source data to a canonical
/// calendar date. Returns `None` for anything unrecognized.
pub fn parse_date_fuzzy(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    for format in DATE_ONLY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}

/// Extract candidate facts from one source record.
///
/// Emission order follows `fields`. A monitored field with an empty cell
/// yields nothing; a non-empty cell that does not parse as a date is
/// reported in `unparsable` instead of becoming a fact. The input record
/// is not modified.
pub fn extract_facts(
    record: &SourceRecord,
    record_id: u64,
    group: &GroupCode,
    marketplace_column: &str,
    fields: &[FieldSpec]
) -> Extraction {
    let marketplace = record.cell(marketplace_column).unwrap_or("").to_string();

    let mut extraction = Extraction::default();
    for field in fields {
        let Some(raw) = record.cell(&field.date_column) else {
            continue;
        };
        match parse_date_fuzzy(raw) {
            Some(occurrence_date) => {
                let actor = record.cell(&field.actor_column).unwrap_or("").to_string();
                extraction.facts.push(Fact {
                    group: group.clone(),
                    record_id,
                    marketplace: marketplace.clone(),
                    ordinal: field.ordinal,
                    field_name: field.date_column.clone(),
                    occurrence_date,
                    value: raw.to_string(),
                    actor
                });
            }
            None => extraction.unparsable.push(field.date_column.clone())
        }
    }
    extraction
}
