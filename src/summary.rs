use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{COUNTY_COLUMN, ECOSYSTEM_TYPE_COLUMN, EXCHANGE_VALUE_COLUMN, SPECIES_GROUP_COLUMN, YEAR_COLUMN};
use crate::dataset::{DatasetDescriptor, DatasetKind, IdentifierKind};
use crate::table::{CellValue, RecordTable};
use crate::validation::distinct_text;

/// Inclusive span of years present in a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min_year: i64,
    pub max_year: i64,
}

impl YearRange {
    pub fn merge(self, other: YearRange) -> YearRange {
        YearRange {
            min_year: self.min_year.min(other.min_year),
            max_year: self.max_year.max(other.max_year),
        }
    }
}

/// Row counts recorded as the table moves through the filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowAccounting {
    pub raw: usize,
    pub removed_null: usize,
    pub removed_aggregate: usize,
}

/// Read-only statistics for one cleaned dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub data_type: DatasetKind,
    pub processing_timestamp: NaiveDateTime,
    pub source_file: Option<String>,
    pub raw_row_count: usize,
    pub cleaned_row_count: usize,
    pub rows_removed: usize,
    pub rows_removed_null: usize,
    pub rows_removed_aggregate: usize,
    pub date_range: Option<YearRange>,
    pub total_exchange_value: f64,
    pub unique_counties: Vec<String>,
    pub unique_species_groups: Vec<String>,
    pub unique_ecosystem_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_area_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_islands: Option<Vec<String>>,
    pub records_by_year: BTreeMap<i64, usize>,
    pub total_value_by_year: BTreeMap<i64, f64>,
    pub quality_issue_count: usize,
}

impl DatasetSummary {
    /// Compute statistics from the final table and the counts recorded on the way
    pub fn from_table(
        descriptor: &DatasetDescriptor,
        table: &RecordTable,
        accounting: RowAccounting,
        source_file: Option<String>,
        quality_issue_count: usize,
        processing_timestamp: NaiveDateTime,
    ) -> Self {
        let mut records_by_year = BTreeMap::new();
        let mut total_value_by_year = BTreeMap::new();
        let mut total_exchange_value = 0.0;

        for row in table.rows() {
            let value = row.get(EXCHANGE_VALUE_COLUMN).and_then(CellValue::as_f64).unwrap_or(0.0);
            total_exchange_value += value;

            // Rows without a year still count toward the total
            if let Some(year) = row.get(YEAR_COLUMN).and_then(CellValue::as_i64) {
                *records_by_year.entry(year).or_insert(0) += 1;
                *total_value_by_year.entry(year).or_insert(0.0) += value;
            }
        }

        let date_range = match (records_by_year.keys().next(), records_by_year.keys().next_back()) {
            (Some(&min_year), Some(&max_year)) => Some(YearRange { min_year, max_year }),
            _ => None,
        };

        let (unique_area_ids, unique_islands) = match descriptor.identifier_kind {
            IdentifierKind::Integer => {
                let ids: BTreeSet<i64> = table
                    .column(&descriptor.identifier_column)
                    .map(|values| values.filter_map(CellValue::as_i64).collect())
                    .unwrap_or_default();
                (Some(ids.into_iter().collect()), None)
            }
            IdentifierKind::Category { .. } => (None, Some(distinct_text(table, &descriptor.identifier_column))),
        };

        let cleaned_row_count = table.len();

        Self {
            data_type: descriptor.kind,
            processing_timestamp,
            source_file,
            raw_row_count: accounting.raw,
            cleaned_row_count,
            rows_removed: accounting.raw.saturating_sub(cleaned_row_count),
            rows_removed_null: accounting.removed_null,
            rows_removed_aggregate: accounting.removed_aggregate,
            date_range,
            total_exchange_value,
            unique_counties: distinct_text(table, COUNTY_COLUMN),
            unique_species_groups: distinct_text(table, SPECIES_GROUP_COLUMN),
            unique_ecosystem_types: distinct_text(table, ECOSYSTEM_TYPE_COLUMN),
            unique_area_ids,
            unique_islands,
            records_by_year,
            total_value_by_year,
            quality_issue_count,
        }
    }
}

/// Totals across both datasets, present only when both cleaned successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_records: usize,
    pub total_exchange_value: f64,
    pub combined_date_range: Option<YearRange>,
}

/// The merged report written at the end of a full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub pipeline_timestamp: NaiveDateTime,
    pub commercial: Option<DatasetSummary>,
    pub non_commercial: Option<DatasetSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<OverallSummary>,
}

impl CombinedSummary {
    /// Merge the child summaries. The overall block is only computed when both exist.
    pub fn combine(
        commercial: Option<&DatasetSummary>,
        non_commercial: Option<&DatasetSummary>,
        pipeline_timestamp: NaiveDateTime,
    ) -> Self {
        let overall = match (commercial, non_commercial) {
            (Some(comm), Some(noncomm)) => Some(OverallSummary {
                total_records: comm.cleaned_row_count + noncomm.cleaned_row_count,
                total_exchange_value: comm.total_exchange_value + noncomm.total_exchange_value,
                combined_date_range: match (comm.date_range, noncomm.date_range) {
                    (Some(a), Some(b)) => Some(a.merge(b)),
                    (a, b) => a.or(b),
                },
            }),
            _ => None,
        };

        Self {
            pipeline_timestamp,
            commercial: commercial.cloned(),
            non_commercial: non_commercial.cloned(),
            overall,
        }
    }
}
