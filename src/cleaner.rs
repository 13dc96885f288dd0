use chrono::Local;
use metrics::{counter, histogram};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::constants::EXPORT_DATE_FORMAT;
use crate::dataset::{DatasetDescriptor, DatasetKind};
use crate::error::{CleanerError, Result};
use crate::filters;
use crate::summary::{DatasetSummary, RowAccounting};
use crate::table::RecordTable;
use crate::validation::{self, TypeCoercionReport, ValidationReport};

const BANNER: &str = "============================================================";

/// Switches for the optional filtering stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleaningOptions {
    /// Drop "All Species" / "All Ecosystems" rows
    pub remove_aggregates: bool,
    /// Drop display-only columns
    pub remove_display: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_aggregates: true,
            remove_display: false,
        }
    }
}

/// Progress of one cleaner invocation.
///
/// `Aborted` is only reachable from `Init` (load failure) and `Loaded` (schema failure),
/// plus an export write failure after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CleanerState {
    Init,
    Loaded,
    SchemaOk,
    Typed,
    Filtered,
    Exported,
    Done,
    Aborted,
}

/// Result of `DatasetCleaner::run_pipeline`
#[derive(Debug)]
pub enum CleaningOutcome {
    Completed {
        output_file: PathBuf,
        rows_written: usize,
        summary: DatasetSummary,
    },
    Aborted {
        /// State the cleaner was in when it failed
        stage: CleanerState,
        error: CleanerError,
    },
}

impl CleaningOutcome {
    pub fn success(&self) -> bool {
        matches!(self, CleaningOutcome::Completed { .. })
    }

    pub fn output_file(&self) -> Option<&Path> {
        match self {
            CleaningOutcome::Completed { output_file, .. } => Some(output_file),
            CleaningOutcome::Aborted { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&DatasetSummary> {
        match self {
            CleaningOutcome::Completed { summary, .. } => Some(summary),
            CleaningOutcome::Aborted { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&CleanerError> {
        match self {
            CleaningOutcome::Completed { .. } => None,
            CleaningOutcome::Aborted { error, .. } => Some(error),
        }
    }
}

/// Validates and filters one fisheries dataset according to its descriptor
pub struct DatasetCleaner {
    descriptor: DatasetDescriptor,
    input_dir: PathBuf,
    output_dir: PathBuf,
    state: CleanerState,
    table: Option<RecordTable>,
    source_file: Option<PathBuf>,
    accounting: RowAccounting,
    report: ValidationReport,
}

impl DatasetCleaner {
    pub fn new(descriptor: DatasetDescriptor, input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            state: CleanerState::Init,
            table: None,
            source_file: None,
            accounting: RowAccounting::default(),
            report: ValidationReport::new(),
        }
    }

    pub fn commercial(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(DatasetDescriptor::commercial(), input_dir, output_dir)
    }

    pub fn non_commercial(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(DatasetDescriptor::non_commercial(), input_dir, output_dir)
    }

    pub fn kind(&self) -> DatasetKind {
        self.descriptor.kind
    }

    pub fn state(&self) -> CleanerState {
        self.state
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Locate the input file: primary pattern first, then the fallback with exclusions.
    /// With several matches the first in name order wins.
    pub fn find_input_file(&self) -> Result<PathBuf> {
        let mut matches = self.glob_input(&self.descriptor.file_pattern, None)?;
        if matches.is_empty() {
            matches = self.glob_input(
                &self.descriptor.fallback_pattern,
                self.descriptor.fallback_exclude.as_deref(),
            )?;
        }

        let mut matches = matches.into_iter();
        let first = matches.next().ok_or_else(|| CleanerError::NoInputFile {
            dataset: self.descriptor.kind.to_string(),
            dir: self.input_dir.clone(),
        })?;

        let ignored: Vec<PathBuf> = matches.collect();
        if !ignored.is_empty() {
            warn!("Multiple {} input files found; using {} and ignoring {:?}", self.descriptor.kind, first.display(), ignored);
        }
        Ok(first)
    }

    fn glob_input(&self, pattern: &str, exclude: Option<&str>) -> Result<Vec<PathBuf>> {
        let dir = glob::Pattern::escape(&self.input_dir.to_string_lossy());
        let full_pattern = format!("{}/{}", dir.trim_end_matches('/'), pattern);

        let mut matches: Vec<PathBuf> = glob::glob(&full_pattern)?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .filter(|path| match (exclude, path.file_name()) {
                (Some(marker), Some(name)) => !name.to_string_lossy().contains(marker),
                _ => true,
            })
            .collect();
        matches.sort();
        Ok(matches)
    }

    /// Find and read the input CSV, recording the raw row count
    pub fn load(&mut self) -> Result<()> {
        info!("📥 Loading {} fisheries data...", self.descriptor.kind);

        let path = self.find_input_file()?;
        let table = RecordTable::from_csv_path(&path)?;
        info!(
            "Loaded {} rows from {}",
            table.len(),
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );
        self.load_table(table, Some(path));
        Ok(())
    }

    /// Accept a table loaded elsewhere, as if `load` had read it
    pub fn load_table(&mut self, table: RecordTable, source_file: Option<PathBuf>) {
        counter!("fisheries_rows_loaded_total", "dataset" => self.descriptor.kind.as_str())
            .increment(table.len() as u64);
        self.accounting = RowAccounting {
            raw: table.len(),
            ..Default::default()
        };
        self.report = ValidationReport::new();
        self.table = Some(table);
        self.source_file = source_file;
        self.state = CleanerState::Loaded;
    }

    /// Check required columns; returns the optional columns present
    pub fn validate_schema(&mut self) -> Result<Vec<String>> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| CleanerError::NotLoaded(self.descriptor.kind.to_string()))?;
        let present = validation::validate_schema(table, &self.descriptor)?;
        self.state = CleanerState::SchemaOk;
        Ok(present)
    }

    pub fn validate_types(&mut self) -> TypeCoercionReport {
        let Some(table) = self.table.as_mut() else {
            return TypeCoercionReport::default();
        };
        let types = validation::validate_types(table, &self.descriptor, &mut self.report);
        self.state = CleanerState::Typed;
        types
    }

    pub fn validate_ranges(&mut self) {
        if let Some(table) = self.table.as_ref() {
            validation::validate_ranges(table, &self.descriptor, &mut self.report);
        }
    }

    /// Ecosystem type, species group, county and (for categorical identifiers) island
    pub fn validate_categories(&mut self) {
        if let Some(table) = self.table.as_ref() {
            validation::validate_categories(table, &self.descriptor, &mut self.report);
        }
    }

    pub fn remove_null_exchange_values(&mut self) -> usize {
        let Some(table) = self.table.as_mut() else { return 0 };
        let removed = filters::remove_null_exchange_values(table);
        self.accounting.removed_null += removed;
        counter!("fisheries_rows_removed_total", "dataset" => self.descriptor.kind.as_str(), "reason" => "null_value")
            .increment(removed as u64);
        removed
    }

    pub fn remove_aggregate_rows(&mut self, remove_aggregates: bool) -> usize {
        let Some(table) = self.table.as_mut() else { return 0 };
        let removed = filters::remove_aggregate_rows(table, &self.descriptor, remove_aggregates);
        self.accounting.removed_aggregate += removed;
        counter!("fisheries_rows_removed_total", "dataset" => self.descriptor.kind.as_str(), "reason" => "aggregate")
            .increment(removed as u64);
        removed
    }

    pub fn remove_display_columns(&mut self, remove_display: bool) -> Vec<String> {
        let Some(table) = self.table.as_mut() else { return Vec::new() };
        let dropped = filters::remove_display_columns(table, &self.descriptor, remove_display);
        self.state = CleanerState::Filtered;
        dropped
    }

    /// Path the cleaned table is written to for today's run
    pub fn output_path(&self) -> PathBuf {
        let stamp = Local::now().format(EXPORT_DATE_FORMAT);
        self.output_dir
            .join(format!("{}{}.csv", self.descriptor.kind.output_prefix(), stamp))
    }

    /// Write the cleaned table; returns the file and the rows written
    pub fn export(&mut self) -> Result<(PathBuf, usize)> {
        info!("💾 Exporting cleaned {} data...", self.descriptor.kind);

        let table = self
            .table
            .as_ref()
            .ok_or_else(|| CleanerError::NotLoaded(self.descriptor.kind.to_string()))?;

        fs::create_dir_all(&self.output_dir)?;
        let output_file = self.output_path();
        let rows_written = table.write_csv_path(&output_file)?;

        info!("Exported {} rows to {}", rows_written, output_file.display());
        self.state = CleanerState::Exported;
        Ok((output_file, rows_written))
    }

    pub fn summarize(&self) -> Option<DatasetSummary> {
        info!("📊 Generating summary statistics...");
        let table = self.table.as_ref()?;
        Some(DatasetSummary::from_table(
            &self.descriptor,
            table,
            self.accounting,
            self.source_file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            self.report.warning_count(),
            Local::now().naive_local(),
        ))
    }

    fn abort(&mut self, error: CleanerError) -> CleaningOutcome {
        let stage = self.state;
        error!("❌ {} cleaning aborted in state {:?}: {}", self.descriptor.kind, stage, error);
        counter!("fisheries_cleaning_runs_total", "dataset" => self.descriptor.kind.as_str(), "status" => "aborted")
            .increment(1);
        self.state = CleanerState::Aborted;
        CleaningOutcome::Aborted { stage, error }
    }

    /// Run every stage in order. Load and schema failures end the run;
    /// validation findings never do.
    #[instrument(skip(self), fields(dataset = %self.descriptor.kind))]
    pub fn run_pipeline(&mut self, options: CleaningOptions) -> CleaningOutcome {
        let started = Instant::now();
        info!("{}", BANNER);
        info!("{} FISHERIES DATA CLEANING PIPELINE", self.descriptor.kind.title());
        info!("{}", BANNER);

        self.state = CleanerState::Init;
        self.table = None;

        if let Err(e) = self.load() {
            return self.abort(e);
        }
        if let Err(e) = self.validate_schema() {
            return self.abort(e);
        }

        self.validate_types();
        self.validate_ranges();
        self.validate_categories();

        self.remove_null_exchange_values();
        self.remove_aggregate_rows(options.remove_aggregates);
        self.remove_display_columns(options.remove_display);

        let (output_file, rows_written) = match self.export() {
            Ok(exported) => exported,
            Err(e) => return self.abort(e),
        };
        let Some(summary) = self.summarize() else {
            return self.abort(CleanerError::NotLoaded(self.descriptor.kind.to_string()));
        };
        self.state = CleanerState::Done;

        counter!("fisheries_cleaning_runs_total", "dataset" => self.descriptor.kind.as_str(), "status" => "success")
            .increment(1);
        histogram!("fisheries_cleaning_duration_seconds", "dataset" => self.descriptor.kind.as_str())
            .record(started.elapsed().as_secs_f64());

        info!("{}", BANNER);
        info!("{} DATA CLEANING COMPLETE", self.descriptor.kind.title());
        info!("Input:  {} rows", summary.raw_row_count);
        info!("Output: {} rows", summary.cleaned_row_count);
        info!("Removed: {} rows", summary.rows_removed);
        info!("{}", BANNER);

        CleaningOutcome::Completed {
            output_file,
            rows_written,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const COMM_HEADER: &str = "year,area_id,county,species_group,ecosystem_type,exchange_value,county_olelo\n";

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_primary_pattern_preferred_over_fallback() {
        let dir = tempdir().unwrap();
        write(dir.path(), "hdar_comm_ev_2021.csv", COMM_HEADER);
        write(dir.path(), "tidied_comm_ev_2021.csv", COMM_HEADER);

        let cleaner = DatasetCleaner::commercial(dir.path(), dir.path().join("out"));
        let found = cleaner.find_input_file().unwrap();
        assert_eq!(found.file_name().unwrap(), "tidied_comm_ev_2021.csv");
    }

    #[test]
    fn test_fallback_excludes_non_commercial_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a_noncomm_ev.csv", COMM_HEADER);
        write(dir.path(), "b_comm_ev.csv", COMM_HEADER);

        let cleaner = DatasetCleaner::commercial(dir.path(), dir.path().join("out"));
        let found = cleaner.find_input_file().unwrap();
        assert_eq!(found.file_name().unwrap(), "b_comm_ev.csv");
    }

    #[test]
    fn test_load_without_input_aborts_from_init() {
        let dir = tempdir().unwrap();
        let mut cleaner = DatasetCleaner::non_commercial(dir.path(), dir.path().join("out"));

        let outcome = cleaner.run_pipeline(CleaningOptions::default());
        assert!(!outcome.success());
        assert!(outcome.output_file().is_none());
        assert!(outcome.summary().is_none());
        assert!(matches!(
            outcome,
            CleaningOutcome::Aborted {
                stage: CleanerState::Init,
                error: CleanerError::NoInputFile { .. }
            }
        ));
        assert_eq!(cleaner.state(), CleanerState::Aborted);
    }

    #[test]
    fn test_row_longer_than_header_aborts_from_init() {
        let dir = tempdir().unwrap();
        let content = format!(
            "{COMM_HEADER}\
             2001,2,Maui,Pelagics,Inshore — Reef,10,Maui\n\
             2001,2,Maui,Pelagics,Extra,Inshore — Reef,20,Maui\n"
        );
        write(dir.path(), "tidied_comm_ev.csv", &content);
        let out = dir.path().join("out");
        let mut cleaner = DatasetCleaner::commercial(dir.path(), &out);

        let outcome = cleaner.run_pipeline(CleaningOptions::default());
        assert!(matches!(
            outcome,
            CleaningOutcome::Aborted {
                stage: CleanerState::Init,
                error: CleanerError::TooManyFields { line: 3, expected: 7, found: 8 }
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_required_column_aborts_from_loaded() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "tidied_comm_ev.csv",
            "year,area_id,county,species_group,ecosystem_type\n2000,1,Maui,Pelagics,Inshore — Reef\n",
        );
        let out = dir.path().join("out");
        let mut cleaner = DatasetCleaner::commercial(dir.path(), &out);

        let outcome = cleaner.run_pipeline(CleaningOptions::default());
        assert!(matches!(
            outcome,
            CleaningOutcome::Aborted {
                stage: CleanerState::Loaded,
                error: CleanerError::MissingColumns { .. }
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_accounting_identity_holds() {
        let dir = tempdir().unwrap();
        let content = format!(
            "{COMM_HEADER}\
             2000,1,Maui,Pelagics,Inshore — Reef,10,Maui\n\
             2000,1,Maui,All Species,Inshore — Reef,20,Maui\n\
             2000,1,Maui,Pelagics,All Ecosystems,,Maui\n\
             2001,2,Kauai,Pelagics,Coastal — Open Ocean,NA,Kauaʻi\n\
             2001,2,Kauai,Pelagics,Coastal — Open Ocean,5,Kauaʻi\n"
        );
        write(dir.path(), "tidied_comm_ev.csv", &content);
        let mut cleaner = DatasetCleaner::commercial(dir.path(), dir.path().join("out"));

        let outcome = cleaner.run_pipeline(CleaningOptions::default());
        let summary = outcome.summary().expect("summary");

        assert_eq!(summary.raw_row_count, 5);
        assert_eq!(summary.rows_removed_null, 2);
        assert_eq!(summary.rows_removed_aggregate, 1);
        assert_eq!(summary.cleaned_row_count, 2);
        assert_eq!(
            summary.raw_row_count - summary.cleaned_row_count,
            summary.rows_removed_null + summary.rows_removed_aggregate
        );
        assert_eq!(cleaner.state(), CleanerState::Done);
    }
}
