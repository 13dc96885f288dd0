use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use fisheries_cleaner::cleaner::{CleaningOptions, DatasetCleaner};
use fisheries_cleaner::config::AppConfig;
use fisheries_cleaner::dataset::DatasetKind;
use fisheries_cleaner::logging;
use fisheries_cleaner::pipeline::FisheriesPipeline;

#[derive(Parser)]
#[command(name = "fisheries_cleaner")]
#[command(about = "Validate and clean Hawaii fisheries exchange-value datasets")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $FISHERIES_CONFIG or ./fisheries.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory containing the tidied input CSVs
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,
    /// Directory for cleaned CSVs and the summary JSON
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Directory for the run log
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean both datasets and write the combined summary
    Run {
        /// Remove "All Species" and "All Ecosystems" rows
        #[arg(long)]
        remove_aggregates: bool,
        /// Remove display-only columns (*_olelo, *_formatted)
        #[arg(long)]
        remove_display: bool,
    },
    /// Clean a single dataset and print its summary
    Clean {
        #[arg(value_enum)]
        dataset: DatasetArg,
        /// Remove "All Species" and "All Ecosystems" rows
        #[arg(long)]
        remove_aggregates: bool,
        /// Remove display-only columns (*_olelo, *_formatted)
        #[arg(long)]
        remove_display: bool,
    },
    /// Print the resolved configuration
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Commercial,
    NonCommercial,
}

impl From<DatasetArg> for DatasetKind {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Commercial => DatasetKind::Commercial,
            DatasetArg::NonCommercial => DatasetKind::NonCommercial,
        }
    }
}

/// Flags can only switch filters on; otherwise the configured value applies
fn resolve_options(config: &AppConfig, remove_aggregates: bool, remove_display: bool) -> CleaningOptions {
    let configured = config.cleaning.options();
    CleaningOptions {
        remove_aggregates: remove_aggregates || configured.remove_aggregates,
        remove_display: remove_display || configured.remove_display,
    }
}

fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.input_dir {
        config.paths.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.paths.output_dir = dir;
    }
    if let Some(dir) = cli.log_dir {
        config.logging.dir = dir;
    }

    if let Commands::ShowConfig = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    // Held until main returns so the log file is flushed on every path
    let logging = logging::init(&config.logging).context("failed to initialize logging")?;

    match cli.command {
        Commands::Run {
            remove_aggregates,
            remove_display,
        } => {
            let options = resolve_options(&config, remove_aggregates, remove_display);
            let mut pipeline = FisheriesPipeline::from_config(&config);
            let run = pipeline.run_full_pipeline(&logging, options)?;

            if run.success {
                println!("\n✓ Data cleaning completed successfully!");
                println!("  Cleaned files saved to: {}", config.paths.output_dir.display());
                println!("  Summary JSON saved to: {}", run.summary_file.display());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("\n✗ Data cleaning encountered errors. Check logs for details.");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Clean {
            dataset,
            remove_aggregates,
            remove_display,
        } => {
            let options = resolve_options(&config, remove_aggregates, remove_display);
            let kind = DatasetKind::from(dataset);
            let mut cleaner = DatasetCleaner::new(
                config.descriptor(kind),
                &config.paths.input_dir,
                &config.paths.output_dir,
            );

            let outcome = cleaner.run_pipeline(options);
            match outcome.summary() {
                Some(summary) => {
                    println!("{}", serde_json::to_string_pretty(summary)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    if let Some(e) = outcome.error() {
                        error!("{} cleaning failed: {}", kind, e);
                    }
                    println!("\n✗ {} data cleaning failed. Check logs for details.", kind);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::ShowConfig => Ok(ExitCode::SUCCESS),
    }
}
