use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::cleaner::{CleaningOptions, CleaningOutcome, DatasetCleaner};
use crate::config::AppConfig;
use crate::constants::{EXPORT_DATE_FORMAT, SUMMARY_FILE_PREFIX};
use crate::dataset::{DatasetDescriptor, DatasetKind};
use crate::error::Result;
use crate::logging::LoggingContext;
use crate::summary::{CombinedSummary, DatasetSummary};

const BANNER: &str = "======================================================================";

/// Recorded outcome of one dataset's cleaning run
#[derive(Debug, Clone, Serialize)]
pub struct DatasetResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DatasetSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DatasetResult {
    fn from_outcome(kind: DatasetKind, outcome: CleaningOutcome) -> Self {
        match outcome {
            CleaningOutcome::Completed {
                output_file, summary, ..
            } => Self {
                success: true,
                output_file: Some(output_file.to_string_lossy().into_owned()),
                summary: Some(summary),
                error: None,
            },
            CleaningOutcome::Aborted { error, .. } => Self {
                success: false,
                output_file: None,
                summary: None,
                error: Some(format!("{} data cleaning failed: {}", kind, error)),
            },
        }
    }
}

/// Per-dataset results, filled in as each cleaner finishes
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResults {
    pub commercial: Option<DatasetResult>,
    pub non_commercial: Option<DatasetResult>,
}

impl PipelineResults {
    fn summary(&self, kind: DatasetKind) -> Option<&DatasetSummary> {
        let result = match kind {
            DatasetKind::Commercial => self.commercial.as_ref(),
            DatasetKind::NonCommercial => self.non_commercial.as_ref(),
        };
        result.and_then(|r| r.summary.as_ref())
    }
}

/// Result of `run_full_pipeline`
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    /// True only when both datasets cleaned successfully
    pub success: bool,
    pub combined: CombinedSummary,
    pub summary_file: PathBuf,
}

/// Runs both dataset cleaners and merges their summaries
pub struct FisheriesPipeline {
    input_dir: PathBuf,
    output_dir: PathBuf,
    commercial: DatasetCleaner,
    non_commercial: DatasetCleaner,
    results: PipelineResults,
}

impl FisheriesPipeline {
    /// Pipeline with the built-in dataset rules
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_descriptors(
            input_dir,
            output_dir,
            DatasetDescriptor::commercial(),
            DatasetDescriptor::non_commercial(),
        )
    }

    /// Pipeline with paths and dataset rules from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_descriptors(
            &config.paths.input_dir,
            &config.paths.output_dir,
            config.descriptor(DatasetKind::Commercial),
            config.descriptor(DatasetKind::NonCommercial),
        )
    }

    pub fn with_descriptors(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        commercial: DatasetDescriptor,
        non_commercial: DatasetDescriptor,
    ) -> Self {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        Self {
            commercial: DatasetCleaner::new(commercial, &input_dir, &output_dir),
            non_commercial: DatasetCleaner::new(non_commercial, &input_dir, &output_dir),
            input_dir,
            output_dir,
            results: PipelineResults::default(),
        }
    }

    pub fn results(&self) -> &PipelineResults {
        &self.results
    }

    /// Clean one dataset and record its result. Returns whether it succeeded.
    pub fn run_cleaning(&mut self, kind: DatasetKind, options: CleaningOptions) -> bool {
        info!("");
        info!("🚀 STARTING {} DATA CLEANING", kind.title());
        info!("");

        let cleaner = match kind {
            DatasetKind::Commercial => &mut self.commercial,
            DatasetKind::NonCommercial => &mut self.non_commercial,
        };
        let result = DatasetResult::from_outcome(kind, cleaner.run_pipeline(options));
        let success = result.success;

        match kind {
            DatasetKind::Commercial => self.results.commercial = Some(result),
            DatasetKind::NonCommercial => self.results.non_commercial = Some(result),
        }
        success
    }

    pub fn run_commercial_cleaning(&mut self, options: CleaningOptions) -> bool {
        self.run_cleaning(DatasetKind::Commercial, options)
    }

    pub fn run_non_commercial_cleaning(&mut self, options: CleaningOptions) -> bool {
        self.run_cleaning(DatasetKind::NonCommercial, options)
    }

    /// Merge both datasets' summaries. Failed datasets appear as null and
    /// suppress the overall block.
    pub fn generate_combined_summary(&self) -> CombinedSummary {
        info!("📊 Generating combined summary statistics...");
        CombinedSummary::combine(
            self.results.summary(DatasetKind::Commercial),
            self.results.summary(DatasetKind::NonCommercial),
            Local::now().naive_local(),
        )
    }

    /// Write the combined summary as pretty JSON to a dated file
    pub fn export_summary(&self, summary: &CombinedSummary) -> Result<PathBuf> {
        info!("💾 Exporting summary statistics to JSON...");

        fs::create_dir_all(&self.output_dir)?;
        let stamp = Local::now().format(EXPORT_DATE_FORMAT);
        let output_file = self.output_dir.join(format!("{}{}.json", SUMMARY_FILE_PREFIX, stamp));

        let json_content = serde_json::to_string_pretty(summary)?;
        fs::write(&output_file, json_content)?;

        info!("Summary exported to {}", output_file.display());
        Ok(output_file)
    }

    /// Log a human-readable report of both datasets' results
    pub fn generate_pipeline_report(&self) {
        info!("");
        info!("{}", BANNER);
        info!("FISHERIES DATA CLEANING PIPELINE - FINAL REPORT");
        info!("{}", BANNER);

        for kind in [DatasetKind::Commercial, DatasetKind::NonCommercial] {
            info!("");
            match self.results.summary(kind) {
                Some(summary) => report_dataset(kind, summary),
                None => info!("{} FISHERIES: FAILED", kind.title()),
            }
        }

        info!("");
        info!("{}", BANNER);
    }

    /// Clean both datasets, report, and export the combined summary.
    /// A failed dataset does not stop the other; the run reports partial success.
    #[instrument(skip_all)]
    pub fn run_full_pipeline(&mut self, logging: &LoggingContext, options: CleaningOptions) -> Result<PipelineRun> {
        if let Some(log_file) = logging.log_file() {
            info!("Logging initialized: {}", log_file.display());
        }

        info!("{}", BANNER);
        info!("FISHERIES DATA CLEANING PIPELINE - START");
        info!("{}", BANNER);
        info!("Input Directory:  {}", display_absolute(&self.input_dir));
        info!("Output Directory: {}", display_absolute(&self.output_dir));
        info!("Remove Aggregates: {}", options.remove_aggregates);
        info!("Remove Display Columns: {}", options.remove_display);
        info!("{}", BANNER);

        let comm_success = self.run_commercial_cleaning(options);
        let noncomm_success = self.run_non_commercial_cleaning(options);

        self.generate_pipeline_report();

        let combined = self.generate_combined_summary();
        let summary_file = self.export_summary(&combined).map_err(|e| {
            error!("❌ Failed to export summary: {}", e);
            e
        })?;

        let success = comm_success && noncomm_success;
        if success {
            info!("✅ PIPELINE STATUS: SUCCESS");
        } else {
            info!("⚠️  PIPELINE STATUS: PARTIAL SUCCESS OR FAILURE");
        }

        Ok(PipelineRun {
            success,
            combined,
            summary_file,
        })
    }
}

fn report_dataset(kind: DatasetKind, summary: &DatasetSummary) {
    info!("{} FISHERIES:", kind.title());
    info!("  Status: SUCCESS");
    info!("  Input Rows:  {}", summary.raw_row_count);
    info!("  Output Rows: {}", summary.cleaned_row_count);
    info!("  Removed:     {}", summary.rows_removed);
    match summary.date_range {
        Some(range) => info!("  Date Range:  {}-{}", range.min_year, range.max_year),
        None => info!("  Date Range:  n/a"),
    }
    info!("  Total Value: ${:.2}", summary.total_exchange_value);
    match kind {
        DatasetKind::Commercial => {
            info!("  Counties:    {}", summary.unique_counties.len());
            info!("  Species:     {}", summary.unique_species_groups.len());
            info!("  DAR Areas:   {}", summary.unique_area_ids.as_ref().map_or(0, Vec::len));
        }
        DatasetKind::NonCommercial => {
            info!("  Islands:     {}", summary.unique_islands.as_ref().map_or(0, Vec::len));
        }
    }
}

fn display_absolute(path: &Path) -> String {
    if path.is_absolute() {
        return path.display().to_string();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
