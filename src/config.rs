use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleaner::CleaningOptions;
use crate::dataset::{DatasetDescriptor, DatasetKind, DatasetOverrides};
use crate::error::{CleanerError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "fisheries.toml";
pub const CONFIG_PATH_ENV: &str = "FISHERIES_CONFIG";
pub const INPUT_DIR_ENV: &str = "FISHERIES_INPUT_DIR";
pub const OUTPUT_DIR_ENV: &str = "FISHERIES_OUTPUT_DIR";
pub const LOG_DIR_ENV: &str = "FISHERIES_LOG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
    pub logging: LoggingConfig,
    pub datasets: DatasetsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/cleaned"),
        }
    }
}

/// Entry-point cleaning switches.
///
/// Aggregate removal defaults to off here while `CleaningOptions::default()`
/// keeps it on for direct cleaner use. Both defaults are intentional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub remove_aggregates: bool,
    pub remove_display: bool,
}

impl CleaningConfig {
    pub fn options(&self) -> CleaningOptions {
        CleaningOptions {
            remove_aggregates: self.remove_aggregates,
            remove_display: self.remove_display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the per-run log file
    pub dir: PathBuf,
    /// Default filter level when RUST_LOG is unset
    pub level: String,
    /// Write the log file as JSON lines instead of plain text
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
            json_file: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    pub commercial: DatasetOverrides,
    pub non_commercial: DatasetOverrides,
}

impl AppConfig {
    /// Load configuration from an explicit path, `$FISHERIES_CONFIG`, or
    /// `fisheries.toml` in the working directory, then apply environment overrides.
    /// A missing default file falls back to built-in settings; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_PATH_ENV).ok().filter(|v| !v.trim().is_empty());

        let mut config = match (explicit, from_env) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(path)) => Self::from_file(Path::new(&path))?,
            (None, None) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            (None, None) => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(dir) = var(INPUT_DIR_ENV) {
            self.paths.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var(OUTPUT_DIR_ENV) {
            self.paths.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var(LOG_DIR_ENV) {
            self.logging.dir = PathBuf::from(dir);
        }
    }

    /// Reject year bounds that cannot match any row
    pub fn validate(&self) -> Result<()> {
        for kind in [DatasetKind::Commercial, DatasetKind::NonCommercial] {
            let descriptor = self.descriptor(kind);
            if descriptor.min_year > descriptor.max_year {
                return Err(CleanerError::Config(format!(
                    "{} min_year {} is after max_year {}",
                    kind, descriptor.min_year, descriptor.max_year
                )));
            }
        }
        Ok(())
    }

    /// Built-in rules for a dataset with this configuration's overrides applied
    pub fn descriptor(&self, kind: DatasetKind) -> DatasetDescriptor {
        let overrides = match kind {
            DatasetKind::Commercial => &self.datasets.commercial,
            DatasetKind::NonCommercial => &self.datasets.non_commercial,
        };
        DatasetDescriptor::for_kind(kind).with_overrides(overrides)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
