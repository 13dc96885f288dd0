use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::constants::{
    COUNTY_COLUMN, ECOSYSTEM_TYPE_COLUMN, EXCHANGE_VALUE_COLUMN, SPECIES_GROUP_COLUMN, YEAR_COLUMN,
};
use crate::dataset::{DatasetDescriptor, IdentifierKind};
use crate::error::{CleanerError, Result};
use crate::table::{CellValue, CoercionStats, RecordTable};

/// Individual data-quality finding. Findings are advisory and never block the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// The type of quality issue
    pub issue_type: QualityIssueType,
    /// Severity level of the issue
    pub severity: QualitySeverity,
    /// Human-readable description of the issue
    pub description: String,
    /// Column that triggered this issue
    pub field: Option<String>,
}

/// Types of quality issues that can be detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityIssueType {
    /// Values that could not be converted to the column's type
    InvalidFormat,
    /// Null values present before removal
    MissingData,
    /// Data outside expected ranges
    OutOfRange,
    /// Categorical value outside the known set
    UnexpectedCategory,
}

/// Severity levels for quality issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualitySeverity {
    Warning,
}

/// Accumulated findings for one cleaning run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<QualityIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning-level finding and log it
    fn warn(&mut self, issue_type: QualityIssueType, field: &str, description: String) {
        warn!("⚠️  Data quality issue: {}", description);
        self.issues.push(QualityIssue {
            issue_type,
            severity: QualitySeverity::Warning,
            description,
            field: Some(field.to_string()),
        });
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == QualitySeverity::Warning)
            .count()
    }

    pub fn has_issue(&self, issue_type: QualityIssueType, field: &str) -> bool {
        self.issues
            .iter()
            .any(|i| i.issue_type == issue_type && i.field.as_deref() == Some(field))
    }
}

/// Check that every required column exists. Returns the optional columns present.
pub fn validate_schema(table: &RecordTable, descriptor: &DatasetDescriptor) -> Result<Vec<String>> {
    info!("🔍 Validating data schema...");

    let missing: Vec<String> = descriptor
        .required_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(CleanerError::MissingColumns { columns: missing });
    }

    let present_optional: Vec<String> = descriptor
        .optional_columns
        .iter()
        .filter(|c| table.has_column(c))
        .cloned()
        .collect();
    if !present_optional.is_empty() {
        info!("Optional columns present: {:?}", present_optional);
    }

    info!("✅ Schema validation passed");
    Ok(present_optional)
}

/// Null counts after type coercion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCoercionReport {
    pub year: CoercionStats,
    pub identifier: Option<CoercionStats>,
    pub exchange_value: CoercionStats,
}

/// Coerce year, integer identifiers and exchange value in place.
/// Unconvertible values become null; nothing here fails.
pub fn validate_types(
    table: &mut RecordTable,
    descriptor: &DatasetDescriptor,
    report: &mut ValidationReport,
) -> TypeCoercionReport {
    info!("🔧 Validating data types...");

    let year = table.coerce_integer(YEAR_COLUMN).unwrap_or_default();
    let identifier = match descriptor.identifier_kind {
        IdentifierKind::Integer => table.coerce_integer(&descriptor.identifier_column),
        IdentifierKind::Category { .. } => None,
    };
    let exchange_value = table.coerce_numeric(EXCHANGE_VALUE_COLUMN).unwrap_or_default();

    for (column, stats) in [
        (YEAR_COLUMN, Some(year)),
        (descriptor.identifier_column.as_str(), identifier),
        (EXCHANGE_VALUE_COLUMN, Some(exchange_value)),
    ] {
        let Some(stats) = stats else { continue };
        if stats.coerced_to_null > 0 {
            report.warn(
                QualityIssueType::InvalidFormat,
                column,
                format!("{} non-numeric {} values converted to null", stats.coerced_to_null, column),
            );
        }
    }

    if year.null_count > 0 {
        report.warn(
            QualityIssueType::MissingData,
            YEAR_COLUMN,
            format!("Found {} null years after conversion", year.null_count),
        );
    }
    if exchange_value.null_count > 0 {
        report.warn(
            QualityIssueType::MissingData,
            EXCHANGE_VALUE_COLUMN,
            format!("Found {} null exchange values after conversion", exchange_value.null_count),
        );
    }

    TypeCoercionReport {
        year,
        identifier,
        exchange_value,
    }
}

/// Flag negative exchange values and years outside the dataset's bounds.
/// Offending rows are left in place.
pub fn validate_ranges(table: &RecordTable, descriptor: &DatasetDescriptor, report: &mut ValidationReport) {
    info!("📏 Validating data ranges...");
    let before = report.issues.len();

    let negative_count = table
        .column(EXCHANGE_VALUE_COLUMN)
        .map(|values| values.filter_map(CellValue::as_f64).filter(|v| *v < 0.0).count())
        .unwrap_or(0);
    if negative_count > 0 {
        report.warn(
            QualityIssueType::OutOfRange,
            EXCHANGE_VALUE_COLUMN,
            format!("{} negative exchange values", negative_count),
        );
    }

    let invalid_years: BTreeSet<i64> = table
        .column(YEAR_COLUMN)
        .map(|values| {
            values
                .filter_map(CellValue::as_i64)
                .filter(|y| *y < descriptor.min_year || *y > descriptor.max_year)
                .collect()
        })
        .unwrap_or_default();
    if !invalid_years.is_empty() {
        report.warn(
            QualityIssueType::OutOfRange,
            YEAR_COLUMN,
            format!(
                "Years outside expected range ({}-{}): {:?}",
                descriptor.min_year, descriptor.max_year, invalid_years
            ),
        );
    }

    if report.issues.len() == before {
        info!("✅ Data range validation passed");
    }
}

/// Compare each categorical column against its expected values
pub fn validate_categories(table: &RecordTable, descriptor: &DatasetDescriptor, report: &mut ValidationReport) {
    validate_category(
        table,
        ECOSYSTEM_TYPE_COLUMN,
        "ecosystem types",
        &descriptor.valid_ecosystem_types,
        report,
    );
    validate_category(
        table,
        SPECIES_GROUP_COLUMN,
        "species groups",
        &descriptor.valid_species_groups,
        report,
    );
    validate_category(
        table,
        COUNTY_COLUMN,
        "county names",
        &descriptor.valid_counties,
        report,
    );
    if let IdentifierKind::Category { ref valid_values } = descriptor.identifier_kind {
        validate_category(table, &descriptor.identifier_column, "island names", valid_values, report);
    }
}

/// Distinct non-null text values of a column, sorted
pub fn distinct_text(table: &RecordTable, column: &str) -> Vec<String> {
    table
        .column(column)
        .map(|values| {
            values
                .filter_map(CellValue::as_text)
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default()
}

fn validate_category(
    table: &RecordTable,
    column: &str,
    label: &str,
    expected: &[String],
    report: &mut ValidationReport,
) {
    info!("Validating {}...", label);

    let observed = distinct_text(table, column);
    let unexpected: Vec<&String> = observed.iter().filter(|v| !expected.contains(v)).collect();
    let nulls = table
        .column(column)
        .map(|values| values.filter(|v| v.is_null()).count())
        .unwrap_or(0);

    if nulls > 0 {
        report.warn(
            QualityIssueType::MissingData,
            column,
            format!("{} null values in {}", nulls, column),
        );
    }

    if unexpected.is_empty() {
        info!("All {} valid: {:?}", label, observed);
    } else {
        report.warn(
            QualityIssueType::UnexpectedCategory,
            column,
            format!("Unexpected {}: {:?}", label, unexpected),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> RecordTable {
        RecordTable::from_csv_reader(csv.as_bytes()).unwrap()
    }

    const HEADER: &str = "year,area_id,county,species_group,ecosystem_type,exchange_value\n";

    #[test]
    fn test_schema_reports_missing_required_columns() {
        let t = table("year,area_id,county,species_group,ecosystem_type\n2000,1,Maui,Pelagics,All Ecosystems\n");
        let err = validate_schema(&t, &DatasetDescriptor::commercial()).unwrap_err();
        match err {
            CleanerError::MissingColumns { columns } => assert_eq!(columns, vec!["exchange_value".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_lists_present_optional_columns() {
        let t = table("year,area_id,county,species_group,ecosystem_type,exchange_value,county_olelo\n");
        let present = validate_schema(&t, &DatasetDescriptor::commercial()).unwrap();
        assert_eq!(present, vec!["county_olelo".to_string()]);

        // Non-commercial requires island instead of area_id
        assert!(validate_schema(&t, &DatasetDescriptor::non_commercial()).is_err());
    }

    #[test]
    fn test_types_convert_invalid_values_to_null() {
        let mut t = table(&format!(
            "{HEADER}2000,1,Maui,Pelagics,Inshore — Reef,10\nabc,x,Maui,Pelagics,Inshore — Reef,oops\n"
        ));
        let mut report = ValidationReport::new();
        let types = validate_types(&mut t, &DatasetDescriptor::commercial(), &mut report);

        assert_eq!(types.year.coerced_to_null, 1);
        assert_eq!(types.identifier.unwrap().coerced_to_null, 1);
        assert_eq!(types.exchange_value.null_count, 1);
        assert!(report.has_issue(QualityIssueType::MissingData, "exchange_value"));
        assert!(report.has_issue(QualityIssueType::InvalidFormat, "area_id"));
    }

    #[test]
    fn test_ranges_are_advisory() {
        let mut t = table(&format!(
            "{HEADER}1996,1,Maui,Pelagics,Coastal — Open Ocean,500\n2000,1,Maui,Pelagics,Inshore — Reef,-3\n"
        ));
        let descriptor = DatasetDescriptor::commercial();
        let mut report = ValidationReport::new();
        validate_types(&mut t, &descriptor, &mut report);
        validate_ranges(&t, &descriptor, &mut report);

        assert!(report.has_issue(QualityIssueType::OutOfRange, "year"));
        assert!(report.has_issue(QualityIssueType::OutOfRange, "exchange_value"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_categories_flag_unexpected_values() {
        let t = table(
            "year,island,county,species_group,ecosystem_type,exchange_value\n\
             2010,Oahu,Honolulu,Herbivores,Inshore — Reef,1\n\
             2010,Niihau,Kauai,Pelagics,Deep Sea,2\n",
        );
        let mut report = ValidationReport::new();
        validate_categories(&t, &DatasetDescriptor::non_commercial(), &mut report);

        assert!(report.has_issue(QualityIssueType::UnexpectedCategory, "island"));
        assert!(report.has_issue(QualityIssueType::UnexpectedCategory, "species_group"));
        assert!(report.has_issue(QualityIssueType::UnexpectedCategory, "ecosystem_type"));
        assert!(!report.has_issue(QualityIssueType::UnexpectedCategory, "county"));
        assert_eq!(report.warning_count(), 3);
        assert_eq!(t.len(), 2);
    }
}
