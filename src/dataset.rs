use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

/// The two fisheries datasets handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Commercial,
    NonCommercial,
}

impl DatasetKind {
    /// Stable name used in summaries and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Commercial => "commercial",
            DatasetKind::NonCommercial => "non_commercial",
        }
    }

    /// Human-readable heading for log banners
    pub fn title(&self) -> &'static str {
        match self {
            DatasetKind::Commercial => "COMMERCIAL",
            DatasetKind::NonCommercial => "NON-COMMERCIAL",
        }
    }

    pub fn output_prefix(&self) -> &'static str {
        match self {
            DatasetKind::Commercial => "cleaned_commercial_",
            DatasetKind::NonCommercial => "cleaned_noncommercial_",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the dataset's location identifier column is typed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IdentifierKind {
    /// Numeric identifier such as a DAR catch area
    Integer,
    /// Categorical identifier checked against a known set
    Category { valid_values: Vec<String> },
}

/// Everything that distinguishes one dataset's cleaning rules from the other's
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDescriptor {
    pub kind: DatasetKind,
    pub file_pattern: String,
    pub fallback_pattern: String,
    /// Fallback matches whose file name contains this marker are skipped
    pub fallback_exclude: Option<String>,
    pub required_columns: Vec<String>,
    pub optional_columns: Vec<String>,
    pub identifier_column: String,
    pub identifier_kind: IdentifierKind,
    pub min_year: i64,
    pub max_year: i64,
    pub valid_counties: Vec<String>,
    pub valid_species_groups: Vec<String>,
    pub valid_ecosystem_types: Vec<String>,
    pub aggregate_species: Vec<String>,
    pub aggregate_ecosystems: Vec<String>,
    pub display_columns: Vec<String>,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn required_with(identifier: &str) -> Vec<String> {
    owned(&[
        YEAR_COLUMN,
        identifier,
        COUNTY_COLUMN,
        SPECIES_GROUP_COLUMN,
        ECOSYSTEM_TYPE_COLUMN,
        EXCHANGE_VALUE_COLUMN,
    ])
}

impl DatasetDescriptor {
    /// Commercial landings by DAR catch area, 1997-2021
    pub fn commercial() -> Self {
        Self {
            kind: DatasetKind::Commercial,
            file_pattern: COMMERCIAL_FILE_PATTERN.to_string(),
            fallback_pattern: COMMERCIAL_FALLBACK_PATTERN.to_string(),
            fallback_exclude: Some(NONCOMMERCIAL_NAME_MARKER.to_string()),
            required_columns: required_with(AREA_ID_COLUMN),
            optional_columns: owned(&[COUNTY_OLELO_COLUMN, EXCHANGE_VALUE_FORMATTED_COLUMN]),
            identifier_column: AREA_ID_COLUMN.to_string(),
            identifier_kind: IdentifierKind::Integer,
            min_year: COMMERCIAL_MIN_YEAR,
            max_year: COMMERCIAL_MAX_YEAR,
            valid_counties: owned(VALID_COUNTIES),
            valid_species_groups: owned(COMMERCIAL_SPECIES_GROUPS),
            valid_ecosystem_types: owned(ECOSYSTEM_TYPES),
            aggregate_species: owned(&[ALL_SPECIES]),
            aggregate_ecosystems: owned(&[ALL_ECOSYSTEMS]),
            display_columns: owned(DISPLAY_ONLY_COLUMNS),
        }
    }

    /// Non-commercial catch by island, 2005-2022
    pub fn non_commercial() -> Self {
        Self {
            kind: DatasetKind::NonCommercial,
            file_pattern: NONCOMMERCIAL_FILE_PATTERN.to_string(),
            fallback_pattern: NONCOMMERCIAL_FALLBACK_PATTERN.to_string(),
            fallback_exclude: None,
            required_columns: required_with(ISLAND_COLUMN),
            optional_columns: owned(&[
                ISLAND_OLELO_COLUMN,
                COUNTY_OLELO_COLUMN,
                EXCHANGE_VALUE_FORMATTED_COLUMN,
            ]),
            identifier_column: ISLAND_COLUMN.to_string(),
            identifier_kind: IdentifierKind::Category {
                valid_values: owned(VALID_ISLANDS),
            },
            min_year: NONCOMMERCIAL_MIN_YEAR,
            max_year: NONCOMMERCIAL_MAX_YEAR,
            valid_counties: owned(VALID_COUNTIES),
            valid_species_groups: owned(NONCOMMERCIAL_SPECIES_GROUPS),
            valid_ecosystem_types: owned(ECOSYSTEM_TYPES),
            aggregate_species: owned(&[ALL_SPECIES]),
            aggregate_ecosystems: owned(&[ALL_ECOSYSTEMS]),
            display_columns: owned(DISPLAY_ONLY_COLUMNS),
        }
    }

    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Commercial => Self::commercial(),
            DatasetKind::NonCommercial => Self::non_commercial(),
        }
    }

    /// Apply configuration overrides on top of the built-in rules
    pub fn with_overrides(mut self, overrides: &DatasetOverrides) -> Self {
        if let Some(min_year) = overrides.min_year {
            self.min_year = min_year;
        }
        if let Some(max_year) = overrides.max_year {
            self.max_year = max_year;
        }
        if let Some(ref pattern) = overrides.file_pattern {
            self.file_pattern = pattern.clone();
        }
        if let Some(ref counties) = overrides.valid_counties {
            self.valid_counties = counties.clone();
        }
        if let Some(ref species) = overrides.valid_species_groups {
            self.valid_species_groups = species.clone();
        }
        if let Some(ref ecosystems) = overrides.valid_ecosystem_types {
            self.valid_ecosystem_types = ecosystems.clone();
        }
        if let Some(ref display) = overrides.display_columns {
            self.display_columns = display.clone();
        }
        if let (Some(islands), IdentifierKind::Category { valid_values }) =
            (&overrides.valid_islands, &mut self.identifier_kind)
        {
            *valid_values = islands.clone();
        }
        self
    }
}

/// Partial per-dataset rule overrides read from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_counties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_islands: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_species_groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_ecosystem_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_columns: Option<Vec<String>>,
}
